use dom::{DocumentTree, TextRange};
use tracing::debug;

use crate::config::AnchorConfig;
use crate::content::resolve_by_content;
use crate::error::ResolveError;
use crate::structural::resolve_structural;
use crate::types::Anchor;

/// Which layer produced a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Stored locator, text identical.
    Structural,
    /// Stored locator, text accepted by the tolerant gate.
    StructuralTolerant,
    /// Full-text search with the winning context score.
    Content { score: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub range: TextRange,
    pub strategy: Strategy,
}

/// Map `anchor` onto a live range of `tree`.
///
/// Tries the structural locator first and falls back to the context-scored
/// content search on a miss or mismatch. The only error ever returned is
/// [`ResolveError::AnchorUnresolvable`].
pub fn resolve<T: DocumentTree + ?Sized>(
    tree: &T,
    anchor: &Anchor,
    cfg: &AnchorConfig,
) -> Result<Resolution, ResolveError> {
    match resolve_structural(tree, anchor, cfg) {
        Ok(matched) => {
            let strategy = if matched.similarity.is_tolerant() {
                Strategy::StructuralTolerant
            } else {
                Strategy::Structural
            };
            debug!(
                anchor_id = %anchor.id,
                ?strategy,
                similarity = ?matched.similarity,
                "structural resolution"
            );
            return Ok(Resolution {
                range: matched.range,
                strategy,
            });
        }
        Err(reason) => {
            debug!(anchor_id = %anchor.id, %reason, "falling back to content search");
        }
    }

    let found = resolve_by_content(tree, anchor, cfg)?;
    Ok(Resolution {
        range: found.range,
        strategy: Strategy::Content { score: found.score },
    })
}

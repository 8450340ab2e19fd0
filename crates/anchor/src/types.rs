use canonical::is_blank;
use dom::StructuralPath;
use serde::{Deserialize, Deserializer, Serialize};

use crate::color::{lenient_color, HighlightColor};
use crate::error::AnchorError;

/// Serializable description of a highlighted text range.
///
/// The wire format keeps the field names of the first released record shape
/// (`startContainerXPath`, `timestamp`, ...) so old stores and exports stay
/// readable. Fields added later (`note`, `contextBefore`, `contextAfter`)
/// default to the empty string when absent or `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchor {
    pub id: String,
    /// Raw, untrimmed text of the range at creation time.
    pub text: String,
    #[serde(default, deserialize_with = "lenient_color")]
    pub color: HighlightColor,
    #[serde(default, deserialize_with = "string_or_null")]
    pub note: String,
    #[serde(
        rename = "startContainerXPath",
        default,
        deserialize_with = "lenient_path"
    )]
    pub start_path: Option<StructuralPath>,
    /// Char offset into the text of the element named by `start_path`.
    #[serde(default)]
    pub start_offset: usize,
    #[serde(rename = "endContainerXPath", default, deserialize_with = "lenient_path")]
    pub end_path: Option<StructuralPath>,
    #[serde(default)]
    pub end_offset: usize,
    #[serde(default, deserialize_with = "string_or_null")]
    pub context_before: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub context_after: String,
    /// Creation time, milliseconds since the Unix epoch.
    #[serde(rename = "timestamp", alias = "createdAt", default)]
    pub created_at: i64,
}

impl Anchor {
    /// Whether any disambiguating context was captured.
    pub fn has_context(&self) -> bool {
        !self.context_before.is_empty() || !self.context_after.is_empty()
    }

    /// Reject records that can never be restored or deduplicated.
    pub fn validate(&self) -> Result<(), AnchorError> {
        if self.id.trim().is_empty() {
            return Err(AnchorError::InvalidRecord("anchor id is empty".into()));
        }
        if is_blank(&self.text) {
            return Err(AnchorError::InvalidRecord(format!(
                "anchor {} has no text",
                self.id
            )));
        }
        Ok(())
    }
}

fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// An unparseable path only disables structural resolution for that anchor;
/// the content search can still restore it.
fn lenient_path<'de, D>(deserializer: D) -> Result<Option<StructuralPath>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|path| match path.parse() {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::debug!(%path, error = %err, "ignoring unparseable structural path");
            None
        }
    }))
}

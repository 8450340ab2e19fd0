//! Restoration orchestrator.
//!
//! A [`Highlighter`] owns one document and the anchor store for that
//! document's identity. Its lifecycle is `Idle → Restoring → Ready`: the
//! first [`Highlighter::init`] loads every stored anchor, resolves each one
//! and wraps what it finds. New highlights are refused until that first pass
//! completes. Later passes are triggered by substantial document mutations,
//! debounced into a single pass per burst.

use anchor::{encode, resolve, Anchor, AnchorError, HighlightColor, ResolveError, Strategy};
use canonical::DocumentIdentity;
use chrono::Utc;
use dom::{DocumentTree, HighlightMark, NodeId, TextRange};
use store::{AnchorStore, ExportBundle, HighlightStats, ImportSummary, KeyValueStore};
use tracing::{debug, info, warn};

use crate::config::MarkyConfig;
use crate::debounce::Debouncer;
use crate::error::HighlighterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreState {
    Idle,
    Restoring,
    Ready,
}

/// Outcome of one restoration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Anchors loaded from the store.
    pub total: usize,
    /// Anchors whose wrapper was already in the document.
    pub already_present: usize,
    pub structural: usize,
    pub structural_tolerant: usize,
    pub content: usize,
    /// Ids that could not be placed this pass. They stay in the store.
    pub unresolved: Vec<String>,
}

impl RestoreReport {
    pub fn restored(&self) -> usize {
        self.structural + self.structural_tolerant + self.content
    }
}

pub struct Highlighter<D, S> {
    document: D,
    store: AnchorStore<S>,
    location: String,
    config: MarkyConfig,
    state: RestoreState,
    debouncer: Debouncer,
}

impl<D: DocumentTree, S: KeyValueStore> Highlighter<D, S> {
    /// Bind `document`, loaded from `location`, to `backend`.
    ///
    /// Fails when the location has no identity (unsupported scheme or not a
    /// URL) or the anchor settings are inconsistent.
    pub fn new(
        document: D,
        backend: S,
        location: &str,
        config: MarkyConfig,
    ) -> Result<Self, HighlighterError> {
        config.anchor.validate()?;
        let identity = DocumentIdentity::from_location(location)?;
        debug!(
            key = identity.key_set().canonical(),
            aliases = identity.key_set().aliases().len(),
            "derived document identity"
        );
        Ok(Self {
            document,
            store: AnchorStore::new(backend, identity.key_set()),
            location: location.to_string(),
            debouncer: Debouncer::new(config.restore.quiet_period()),
            config,
            state: RestoreState::Idle,
        })
    }

    pub fn state(&self) -> RestoreState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == RestoreState::Ready
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// Mutable access for the host. Report inserted subtrees through
    /// [`Highlighter::observe_mutation`].
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn store(&self) -> &AnchorStore<S> {
        &self.store
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn config(&self) -> &MarkyConfig {
        &self.config
    }

    /// Run the initial restoration pass.
    pub async fn init(&mut self) -> Result<RestoreReport, HighlighterError> {
        self.restore().await
    }

    /// Place every stored anchor that is not already wrapped.
    ///
    /// Individual anchors that cannot be resolved or wrapped are skipped and
    /// reported; only a failing store read aborts the pass, leaving the
    /// previous state in place.
    pub async fn restore(&mut self) -> Result<RestoreReport, HighlighterError> {
        let previous = self.state;
        self.state = RestoreState::Restoring;

        let anchors = match self.store.load_all().await {
            Ok(anchors) => anchors,
            Err(err) => {
                warn!(error = %err, "could not load anchors; restoration aborted");
                self.state = previous;
                return Err(err.into());
            }
        };

        let mut report = RestoreReport {
            total: anchors.len(),
            ..RestoreReport::default()
        };
        for anchor in &anchors {
            if self.document.has_highlight(&anchor.id) {
                report.already_present += 1;
                continue;
            }
            match self.place(anchor) {
                Ok(Strategy::Structural) => report.structural += 1,
                Ok(Strategy::StructuralTolerant) => report.structural_tolerant += 1,
                Ok(Strategy::Content { .. }) => report.content += 1,
                Err(err) => {
                    warn!(anchor_id = %anchor.id, error = %err, "highlight not restored");
                    report.unresolved.push(anchor.id.clone());
                }
            }
        }

        self.state = RestoreState::Ready;
        info!(
            total = report.total,
            restored = report.restored(),
            already_present = report.already_present,
            content = report.content,
            unresolved = report.unresolved.len(),
            "restoration pass finished"
        );
        Ok(report)
    }

    fn place(&mut self, anchor: &Anchor) -> Result<Strategy, PlaceError> {
        let resolution = resolve(&self.document, anchor, &self.config.anchor)?;
        if let Strategy::Content { score } = resolution.strategy {
            debug!(anchor_id = %anchor.id, score, "restored by content search");
        }
        let mark = HighlightMark::new(anchor.id.clone(), anchor.color.as_str());
        if self.document.wrap_range(&resolution.range, &mark)? == 0 {
            return Err(PlaceError::NothingWrapped);
        }
        Ok(resolution.strategy)
    }

    /// Highlight the host's current selection.
    pub async fn highlight_selection(
        &mut self,
        color: HighlightColor,
    ) -> Result<Anchor, HighlighterError> {
        let range = self
            .document
            .current_selection()
            .ok_or(AnchorError::NoSelection)?;
        self.highlight_range(range, color).await
    }

    /// Encode, persist and wrap `range`.
    ///
    /// The anchor is saved before the document is touched, so a failed save
    /// leaves no wrapper behind.
    pub async fn highlight_range(
        &mut self,
        range: TextRange,
        color: HighlightColor,
    ) -> Result<Anchor, HighlighterError> {
        if !self.is_ready() {
            return Err(HighlighterError::NotReady);
        }
        if range.is_collapsed() {
            return Err(AnchorError::CollapsedSelection.into());
        }
        let range = self.document.normalize_range(range)?;
        let anchor = encode(&self.document, range, color, &self.config.anchor)?;

        if let Err(err) = self.store.save(&anchor).await {
            warn!(anchor_id = %anchor.id, error = %err, "failed to save highlight");
            return Err(err.into());
        }

        let mark = HighlightMark::new(anchor.id.clone(), color.as_str());
        self.document.wrap_range(&range, &mark)?;
        info!(anchor_id = %anchor.id, color = %color, "highlight created");
        Ok(anchor)
    }

    /// Highlight id of the wrapper containing `node`, if any.
    pub fn highlight_at(&self, node: NodeId) -> Option<String> {
        self.document
            .enclosing_highlight(node)
            .map(|mark| mark.id.clone())
    }

    /// Delete the anchor from every store key, then unwrap it. The wrapper
    /// stays when the store call fails.
    pub async fn remove_highlight(&mut self, id: &str) -> Result<bool, HighlighterError> {
        let stored = self.store.remove(id).await?;
        let unwrapped = self.document.unwrap_highlight(id);
        debug!(anchor_id = %id, stored, unwrapped, "highlight removed");
        Ok(stored || unwrapped > 0)
    }

    pub async fn update_note(&mut self, id: &str, note: &str) -> Result<bool, HighlighterError> {
        Ok(self.store.update_note(id, note).await?)
    }

    /// Remove every stored key of this identity and unwrap every highlight.
    /// Returns the number of highlights unwrapped.
    pub async fn clear_all(&mut self) -> Result<usize, HighlighterError> {
        self.store.clear_all().await?;
        let ids = self.document.highlight_ids();
        for id in &ids {
            self.document.unwrap_highlight(id);
        }
        info!(unwrapped = ids.len(), "cleared all highlights");
        Ok(ids.len())
    }

    /// Store every new anchor and run a restoration pass to place them.
    pub async fn import(
        &mut self,
        anchors: Vec<Anchor>,
    ) -> Result<(ImportSummary, RestoreReport), HighlighterError> {
        let summary = self.store.import(anchors).await?;
        let report = self.restore().await?;
        Ok((summary, report))
    }

    /// [`Highlighter::import`] from the text of an export file.
    pub async fn import_json(
        &mut self,
        raw: &str,
    ) -> Result<(ImportSummary, RestoreReport), HighlighterError> {
        let bundle = ExportBundle::from_json(raw)?;
        self.import(bundle.highlights).await
    }

    pub async fn export(&self, title: &str) -> Result<ExportBundle, HighlighterError> {
        let anchors = self.store.export().await?;
        Ok(ExportBundle::new(
            self.location.clone(),
            title,
            anchors,
            Utc::now(),
        ))
    }

    pub async fn stats(&self) -> Result<HighlightStats, HighlighterError> {
        let anchors = self.store.load_all().await?;
        Ok(HighlightStats::from_anchors(&anchors))
    }

    /// Report a subtree the host inserted into the document.
    ///
    /// Schedules (or pushes back) a restoration pass when `inserted` is an
    /// element outside any highlight whose text exceeds the configured
    /// minimum. The timer lives on the current tokio runtime; called outside
    /// one, nothing is scheduled. Returns whether a pass was scheduled.
    pub fn observe_mutation(&mut self, inserted: NodeId) -> bool {
        if self.document.tag_name(inserted).is_none()
            || self.document.is_inside_highlight(inserted)
        {
            return false;
        }
        let text_len = self.document.text_content(inserted).chars().count();
        if text_len <= self.config.restore.min_mutation_text_len {
            return false;
        }
        if !self.debouncer.schedule() {
            return false;
        }
        debug!(node = %inserted, text_len, "restoration scheduled");
        true
    }

    pub fn restore_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Wait for the pending debounce timer and run the pass it guards.
    /// Returns `None` when nothing was scheduled.
    pub async fn run_scheduled_restore(
        &mut self,
    ) -> Result<Option<RestoreReport>, HighlighterError> {
        if !self.debouncer.elapsed().await {
            return Ok(None);
        }
        self.restore().await.map(Some)
    }
}

#[derive(Debug, thiserror::Error)]
enum PlaceError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Dom(#[from] dom::DomError),
    #[error("resolved range produced no highlight")]
    NothingWrapped,
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::MemoryDocument;
    use store::InMemoryStore;

    const PAGE: &str = "https://blog.test/posts/anchors";

    fn page() -> (MemoryDocument, NodeId) {
        let (mut doc, body) = MemoryDocument::with_body();
        let p = doc.append_element(body, "p").unwrap();
        let text = doc
            .append_text(p, "Anchors survive edits when they carry context.")
            .unwrap();
        (doc, text)
    }

    #[tokio::test]
    async fn refuses_highlights_before_first_pass() {
        let (doc, text) = page();
        let mut highlighter =
            Highlighter::new(doc, InMemoryStore::new(), PAGE, MarkyConfig::default()).unwrap();
        let range = highlighter.document().create_range(text, 0, text, 7).unwrap();

        assert_eq!(highlighter.state(), RestoreState::Idle);
        assert!(matches!(
            highlighter.highlight_range(range, HighlightColor::Yellow).await,
            Err(HighlighterError::NotReady)
        ));

        highlighter.init().await.unwrap();
        assert!(highlighter.is_ready());
        let anchor = highlighter
            .highlight_range(range, HighlightColor::Yellow)
            .await
            .unwrap();
        assert_eq!(anchor.text, "Anchors");
        assert!(highlighter.document().has_highlight(&anchor.id));
    }

    #[test]
    fn unsupported_location_is_rejected() {
        let (doc, _) = page();
        assert!(matches!(
            Highlighter::new(doc, InMemoryStore::new(), "about:blank", MarkyConfig::default()),
            Err(HighlighterError::Identity(_))
        ));
    }

    #[test]
    fn mutations_outside_a_runtime_schedule_nothing() {
        let (doc, _) = page();
        let mut highlighter =
            Highlighter::new(doc, InMemoryStore::new(), PAGE, MarkyConfig::default()).unwrap();
        let body = highlighter.document().children(highlighter.document().root())[0];
        let late = highlighter.document_mut().append_element(body, "section").unwrap();
        highlighter
            .document_mut()
            .append_text(late, "A paragraph that arrived after the first pass.")
            .unwrap();

        assert!(!highlighter.observe_mutation(late));
        assert!(!highlighter.restore_pending());
    }

    #[tokio::test]
    async fn restore_is_idempotent() {
        let (doc, text) = page();
        let mut highlighter =
            Highlighter::new(doc, InMemoryStore::new(), PAGE, MarkyConfig::default()).unwrap();
        highlighter.init().await.unwrap();
        let range = highlighter.document().create_range(text, 8, text, 15).unwrap();
        highlighter
            .highlight_range(range, HighlightColor::Green)
            .await
            .unwrap();

        let report = highlighter.restore().await.unwrap();
        assert_eq!(report.total, 1);
        assert_eq!(report.already_present, 1);
        assert_eq!(report.restored(), 0);
        assert_eq!(highlighter.document().highlight_ids().len(), 1);
    }

    #[tokio::test]
    async fn small_or_highlighted_insertions_do_not_schedule() {
        let (doc, text) = page();
        let mut highlighter =
            Highlighter::new(doc, InMemoryStore::new(), PAGE, MarkyConfig::default()).unwrap();
        highlighter.init().await.unwrap();

        let body = highlighter.document().children(highlighter.document().root())[0];
        let small = highlighter.document_mut().append_element(body, "div").unwrap();
        highlighter
            .document_mut()
            .append_text(small, "short text")
            .unwrap();
        assert!(!highlighter.observe_mutation(small));
        assert!(!highlighter.observe_mutation(text));

        let range = highlighter.document().create_range(text, 0, text, 20).unwrap();
        let anchor = highlighter
            .highlight_range(range, HighlightColor::Blue)
            .await
            .unwrap();
        let wrapper = highlighter
            .document()
            .descendants(highlighter.document().root())
            .into_iter()
            .find(|node| highlighter.document().highlight(*node).is_some())
            .unwrap();
        assert_eq!(highlighter.highlight_at(wrapper), Some(anchor.id));
        assert!(!highlighter.observe_mutation(wrapper));
        assert!(!highlighter.restore_pending());
    }
}

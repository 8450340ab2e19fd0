//! Alias-aware anchor persistence.
//!
//! One document identity may have anchors under its canonical key and under
//! any of its alias keys (older key shapes). Reads merge every key in
//! priority order and deduplicate by anchor id; writes go to the canonical
//! key, while removals and note edits reach every key holding the anchor.
//!
//! Write paths operate on the raw JSON records so that fields this version
//! does not know about survive a read-modify-write cycle. Every write is
//! preceded by a fresh read of the same key.

use std::collections::{HashMap, HashSet};

use anchor::Anchor;
use canonical::KeySet;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{KeyValueStore, StoreError};

/// Outcome of [`AnchorStore::import`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

pub struct AnchorStore<S> {
    backend: S,
    keys: KeySet,
}

impl<S: KeyValueStore> AnchorStore<S> {
    pub fn new(backend: S, keys: KeySet) -> Self {
        Self { backend, keys }
    }

    pub fn keys(&self) -> &KeySet {
        &self.keys
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Every anchor stored for this identity, deduplicated by id with the
    /// first occurrence in key priority order winning.
    ///
    /// When duplicates were found the canonical key is rewritten: its own raw
    /// records stay as they are and alias records with new ids are appended.
    /// Alias keys are left untouched, and a canonical key that does not hold
    /// a list is never overwritten.
    pub async fn load_all(&self) -> Result<Vec<Anchor>, StoreError> {
        let keys: Vec<String> = self.keys.iter().map(str::to_string).collect();
        let stored = self.backend.get_many(&keys).await?;

        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        let mut duplicates = 0usize;
        for key in &keys {
            let Some(value) = stored.get(key) else {
                continue;
            };
            for anchor in decode_records(key, value) {
                if seen.insert(anchor.id.clone()) {
                    merged.push(anchor);
                } else {
                    duplicates += 1;
                }
            }
        }

        if duplicates > 0 {
            self.migrate_into_canonical(&keys, &stored, &seen, duplicates)
                .await;
        }
        Ok(merged)
    }

    async fn migrate_into_canonical(
        &self,
        keys: &[String],
        stored: &HashMap<String, Value>,
        live_ids: &HashSet<String>,
        duplicates: usize,
    ) {
        let canonical = self.keys.canonical();
        let mut records = match stored.get(canonical) {
            None => Vec::new(),
            Some(Value::Array(records)) => records.clone(),
            Some(_) => {
                warn!(key = canonical, "canonical key is not a list; skipping merge");
                return;
            }
        };

        let mut present: HashSet<String> = records
            .iter()
            .filter_map(record_id)
            .map(str::to_string)
            .collect();
        for key in keys.iter().filter(|key| key.as_str() != canonical) {
            let Some(Value::Array(alias_records)) = stored.get(key) else {
                continue;
            };
            for record in alias_records {
                let Some(id) = record_id(record) else {
                    continue;
                };
                if live_ids.contains(id) && present.insert(id.to_string()) {
                    records.push(record.clone());
                }
            }
        }

        info!(
            key = canonical,
            duplicates,
            records = records.len(),
            "merging duplicate anchors into canonical key"
        );
        if let Err(err) = self.backend.set(canonical, Value::Array(records)).await {
            warn!(error = %err, "failed to rewrite canonical key; keeping merged view");
        }
    }

    /// Append `anchor` to the canonical key.
    pub async fn save(&self, anchor: &Anchor) -> Result<(), StoreError> {
        let key = self.keys.canonical();
        let mut records = self.read_raw(key).await?;
        records.push(serde_json::to_value(anchor)?);
        self.backend.set(key, Value::Array(records)).await?;
        debug!(anchor_id = %anchor.id, key, "saved anchor");
        Ok(())
    }

    /// Remove the anchor from every key that holds it. Returns whether any
    /// key did.
    pub async fn remove(&self, id: &str) -> Result<bool, StoreError> {
        self.rewrite_matching(id, |records| {
            records.retain(|record| record_id(record) != Some(id));
        })
        .await
    }

    /// Replace the note of the anchor under every key that holds it.
    pub async fn update_note(&self, id: &str, note: &str) -> Result<bool, StoreError> {
        self.rewrite_matching(id, |records| {
            for record in records.iter_mut() {
                if record_id(record) == Some(id) {
                    if let Some(fields) = record.as_object_mut() {
                        fields.insert("note".to_string(), Value::String(note.to_string()));
                    }
                }
            }
        })
        .await
    }

    /// Delete the canonical key and every alias key.
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        for key in self.keys.iter() {
            self.backend.remove(key).await?;
        }
        info!(key = self.keys.canonical(), "cleared all anchor keys");
        Ok(())
    }

    /// Save each anchor whose id is not stored yet. Records with an empty
    /// id or blank text are skipped.
    pub async fn import(&self, anchors: Vec<Anchor>) -> Result<ImportSummary, StoreError> {
        let mut known: HashSet<String> = self
            .load_all()
            .await?
            .into_iter()
            .map(|anchor| anchor.id)
            .collect();

        let mut summary = ImportSummary::default();
        for anchor in anchors {
            if let Err(err) = anchor.validate() {
                debug!(error = %err, "skipping invalid imported anchor");
                summary.skipped += 1;
                continue;
            }
            if known.contains(&anchor.id) {
                debug!(anchor_id = %anchor.id, "skipping already stored anchor");
                summary.skipped += 1;
                continue;
            }
            self.save(&anchor).await?;
            known.insert(anchor.id);
            summary.imported += 1;
        }
        info!(
            imported = summary.imported,
            skipped = summary.skipped,
            "import finished"
        );
        Ok(summary)
    }

    /// The canonical key's list as stored, without touching alias keys.
    /// Unreadable records are left out of the result.
    pub async fn export(&self) -> Result<Vec<Anchor>, StoreError> {
        let key = self.keys.canonical();
        let records = self.read_raw(key).await?;
        Ok(decode_records(key, &Value::Array(records)))
    }

    async fn read_raw(&self, key: &str) -> Result<Vec<Value>, StoreError> {
        match self.backend.get(key).await? {
            None => Ok(Vec::new()),
            Some(Value::Array(records)) => Ok(records),
            Some(_) => Err(StoreError::Corrupt {
                key: key.to_string(),
            }),
        }
    }

    async fn rewrite_matching<F>(&self, id: &str, mut edit: F) -> Result<bool, StoreError>
    where
        F: FnMut(&mut Vec<Value>) + Send,
    {
        let mut touched = false;
        for key in self.keys.iter() {
            let mut records = match self.read_raw(key).await {
                Ok(records) => records,
                Err(StoreError::Corrupt { key }) => {
                    warn!(%key, "skipping corrupt anchor key");
                    continue;
                }
                Err(err) => return Err(err),
            };
            if !records.iter().any(|record| record_id(record) == Some(id)) {
                continue;
            }
            edit(&mut records);
            self.backend.set(key, Value::Array(records)).await?;
            touched = true;
        }
        Ok(touched)
    }
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

/// Decode the records under one key, skipping anything unreadable.
fn decode_records(key: &str, value: &Value) -> Vec<Anchor> {
    let Some(records) = value.as_array() else {
        warn!(%key, "stored value is not a list of anchors; ignoring key");
        return Vec::new();
    };
    records
        .iter()
        .filter_map(|record| {
            let anchor = match serde_json::from_value::<Anchor>(record.clone()) {
                Ok(anchor) => anchor,
                Err(err) => {
                    warn!(%key, error = %err, "skipping unreadable anchor record");
                    return None;
                }
            };
            match anchor.validate() {
                Ok(()) => Some(anchor),
                Err(err) => {
                    warn!(%key, error = %err, "skipping invalid anchor record");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryStore;
    use anchor::HighlightColor;
    use serde_json::json;

    const CANONICAL: &str = "highlights_https://news.test/story";
    const QUERY_ALIAS: &str = "highlights_https://news.test/story?page=2";
    const HASHED_ALIAS: &str = "highlights_h0123456789abcdef";

    fn store() -> AnchorStore<InMemoryStore> {
        AnchorStore::new(
            InMemoryStore::new(),
            KeySet::new(CANONICAL, [QUERY_ALIAS, HASHED_ALIAS]),
        )
    }

    fn record(id: &str, text: &str) -> Value {
        json!({
            "id": id,
            "text": text,
            "color": "yellow",
            "startContainerXPath": "/html[1]/body[1]/p[1]",
            "startOffset": 0,
            "endContainerXPath": "/html[1]/body[1]/p[1]",
            "endOffset": text.chars().count(),
            "timestamp": 1
        })
    }

    fn anchor(id: &str, text: &str) -> Anchor {
        serde_json::from_value(record(id, text)).unwrap()
    }

    #[tokio::test]
    async fn save_appends_to_canonical_key() {
        let store = store();
        store.save(&anchor("a", "first")).await.unwrap();
        store.save(&anchor("b", "second")).await.unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(
            loaded.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert_eq!(store.backend().keys().unwrap(), vec![CANONICAL.to_string()]);
    }

    #[tokio::test]
    async fn duplicates_across_aliases_merge_into_canonical() {
        let store = store();
        let backend = store.backend();
        backend.set(CANONICAL, json!([record("a", "one")])).await.unwrap();
        backend
            .set(QUERY_ALIAS, json!([record("a", "one"), record("b", "two")]))
            .await
            .unwrap();
        backend.set(HASHED_ALIAS, json!([record("c", "three")])).await.unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(
            loaded.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );

        let canonical = backend.get(CANONICAL).await.unwrap().unwrap();
        assert_eq!(canonical.as_array().unwrap().len(), 3);
        let alias = backend.get(QUERY_ALIAS).await.unwrap().unwrap();
        assert_eq!(alias.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn merge_keeps_raw_canonical_records() {
        let store = store();
        let backend = store.backend();
        let mut titled = record("a", "one");
        titled["pageTitle"] = json!("kept");
        backend
            .set(CANONICAL, json!([titled, {"id": "b", "text": 42}]))
            .await
            .unwrap();
        backend
            .set(QUERY_ALIAS, json!([record("a", "one"), record("c", "three")]))
            .await
            .unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(
            loaded.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "c"]
        );

        let canonical = backend.get(CANONICAL).await.unwrap().unwrap();
        let ids: Vec<&str> = canonical
            .as_array()
            .unwrap()
            .iter()
            .filter_map(record_id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(canonical[0]["pageTitle"], "kept");
        assert_eq!(canonical[1]["text"], 42);
    }

    #[tokio::test]
    async fn merge_never_overwrites_a_corrupt_canonical_key() {
        let store = store();
        let backend = store.backend();
        backend.set(CANONICAL, json!({"not": "a list"})).await.unwrap();
        backend
            .set(QUERY_ALIAS, json!([record("a", "one")]))
            .await
            .unwrap();
        backend
            .set(HASHED_ALIAS, json!([record("a", "one")]))
            .await
            .unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(
            backend.get(CANONICAL).await.unwrap(),
            Some(json!({"not": "a list"}))
        );
    }

    #[tokio::test]
    async fn load_all_is_idempotent() {
        let store = store();
        let backend = store.backend();
        backend.set(CANONICAL, json!([record("a", "one")])).await.unwrap();
        backend
            .set(QUERY_ALIAS, json!([record("b", "two"), record("a", "one")]))
            .await
            .unwrap();
        backend
            .set(HASHED_ALIAS, json!([record("b", "two"), record("c", "three")]))
            .await
            .unwrap();

        let first = store.load_all().await.unwrap();
        let canonical_after_first = backend.get(CANONICAL).await.unwrap();
        let second = store.load_all().await.unwrap();
        let canonical_after_second = backend.get(CANONICAL).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        assert_eq!(canonical_after_first, canonical_after_second);
    }

    #[tokio::test]
    async fn export_reads_only_the_canonical_key() {
        let store = store();
        let backend = store.backend();
        backend
            .set(CANONICAL, json!([record("a", "one"), {"id": "broken"}]))
            .await
            .unwrap();
        backend
            .set(QUERY_ALIAS, json!([record("a", "one"), record("b", "two")]))
            .await
            .unwrap();

        let exported = store.export().await.unwrap();
        assert_eq!(
            exported.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
            vec!["a"]
        );
        assert_eq!(
            backend.get(CANONICAL).await.unwrap(),
            Some(json!([record("a", "one"), {"id": "broken"}]))
        );
    }

    #[tokio::test]
    async fn alias_only_records_are_not_migrated_without_duplicates() {
        let store = store();
        store
            .backend()
            .set(HASHED_ALIAS, json!([record("legacy", "old text")]))
            .await
            .unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(store.backend().get(CANONICAL).await.unwrap(), None);
    }

    #[tokio::test]
    async fn remove_reaches_every_key() {
        let store = store();
        let backend = store.backend();
        backend
            .set(CANONICAL, json!([record("a", "one"), record("b", "two")]))
            .await
            .unwrap();
        backend.set(HASHED_ALIAS, json!([record("a", "one")])).await.unwrap();

        assert!(store.remove("a").await.unwrap());
        assert!(!store.remove("a").await.unwrap());

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "b");
        assert_eq!(backend.get(HASHED_ALIAS).await.unwrap(), Some(json!([])));
    }

    #[tokio::test]
    async fn note_updates_keep_unknown_fields() {
        let store = store();
        let mut legacy = record("a", "one");
        legacy["pageTitle"] = json!("kept");
        store
            .backend()
            .set(QUERY_ALIAS, json!([legacy]))
            .await
            .unwrap();

        assert!(store.update_note("a", "remember this").await.unwrap());
        let raw = store.backend().get(QUERY_ALIAS).await.unwrap().unwrap();
        assert_eq!(raw[0]["note"], "remember this");
        assert_eq!(raw[0]["pageTitle"], "kept");
        assert!(!store.update_note("missing", "x").await.unwrap());
    }

    #[tokio::test]
    async fn clear_all_removes_every_key() {
        let store = store();
        for key in [CANONICAL, QUERY_ALIAS, HASHED_ALIAS] {
            store.backend().set(key, json!([record("a", "one")])).await.unwrap();
        }
        store.backend().set("highlights_other", json!([])).await.unwrap();

        store.clear_all().await.unwrap();
        assert_eq!(
            store.backend().keys().unwrap(),
            vec!["highlights_other".to_string()]
        );
    }

    #[tokio::test]
    async fn import_skips_known_and_blank_records() {
        let store = store();
        store.save(&anchor("a", "one")).await.unwrap();

        let mut blank = anchor("blank", "x");
        blank.text = "   ".into();
        let mut fresh = anchor("b", "two");
        fresh.color = HighlightColor::Orange;

        let summary = store
            .import(vec![anchor("a", "one"), blank, fresh])
            .await
            .unwrap();
        assert_eq!(summary, ImportSummary { imported: 1, skipped: 2 });

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].color, HighlightColor::Orange);
    }

    #[tokio::test]
    async fn unreadable_records_and_keys_are_skipped() {
        let store = store();
        store
            .backend()
            .set(
                CANONICAL,
                json!([record("a", "one"), {"text": "no id"}, 42, record("b", " ")]),
            )
            .await
            .unwrap();
        store
            .backend()
            .set(QUERY_ALIAS, json!({"not": "a list"}))
            .await
            .unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "a");
    }

    #[tokio::test]
    async fn save_refuses_to_overwrite_corrupt_key() {
        let store = store();
        store.backend().set(CANONICAL, json!("garbage")).await.unwrap();
        assert!(matches!(
            store.save(&anchor("a", "one")).await,
            Err(StoreError::Corrupt { .. })
        ));
        assert_eq!(
            store.backend().get(CANONICAL).await.unwrap(),
            Some(json!("garbage"))
        );
    }
}

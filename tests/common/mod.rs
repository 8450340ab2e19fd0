#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use marky::{
    DocumentTree, InMemoryStore, KeyValueStore, MemoryDocument, NodeId, StoreError, TextRange,
};
use serde_json::Value;

pub const PAGE: &str = "https://journal.test/2024/rust-anchors/";

pub const ARTICLE: [&str; 3] = [
    "Anchors are stored as a structural path plus an offset into the element text.",
    "When the page changes the path may point somewhere else entirely.",
    "Context captured around the selection lets the search pick the right occurrence.",
];

/// `<body>` with one `<p>` per paragraph. Returns the document, the body and
/// the text node of every paragraph.
pub fn build(paragraphs: &[&str]) -> (MemoryDocument, NodeId, Vec<NodeId>) {
    let (mut doc, body) = MemoryDocument::with_body();
    let texts = paragraphs
        .iter()
        .map(|text| {
            let p = doc.append_element(body, "p").unwrap();
            doc.append_text(p, text).unwrap()
        })
        .collect();
    (doc, body, texts)
}

/// Range over the first occurrence of `needle` in any single text node.
pub fn find(doc: &MemoryDocument, needle: &str) -> TextRange {
    for node in doc.text_nodes_in_order(doc.root()) {
        let text = doc.text(node).unwrap();
        if let Some(byte) = text.find(needle) {
            let start = text[..byte].chars().count();
            let end = start + needle.chars().count();
            return doc.create_range(node, start, node, end).unwrap();
        }
    }
    panic!("{needle:?} not found");
}

/// Text of every highlight wrapper, keyed by highlight id.
pub fn highlighted_text(doc: &MemoryDocument) -> HashMap<String, String> {
    let mut found: HashMap<String, String> = HashMap::new();
    for node in doc.descendants(doc.root()) {
        if let Some(mark) = doc.highlight(node) {
            found
                .entry(mark.id.clone())
                .or_default()
                .push_str(&doc.text_content(node));
        }
    }
    found
}

/// In-memory store whose reads and writes can be switched to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self, flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::backend("storage unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.check(&self.fail_reads)?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.check(&self.fail_writes)?;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check(&self.fail_writes)?;
        self.inner.remove(key).await
    }
}

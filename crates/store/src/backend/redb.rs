//! Redb-backed persistent store.
//!
//! Values are stored as JSON bytes in a single table. Redb transactions are
//! synchronous, so every operation runs on tokio's blocking pool.
//!
//! ```yaml
//! storage:
//!   backend: redb
//!   path: "/var/lib/marky/highlights.redb"
//! ```

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, TableDefinition};
use serde_json::Value;

use crate::{KeyValueStore, StoreError};

const HIGHLIGHTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("marky_highlights");

pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create the database at `path` and make sure the table exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(backend_err)?;

        let write_txn = db.begin_write().map_err(backend_err)?;
        {
            let _table = write_txn.open_table(HIGHLIGHTS_TABLE).map_err(backend_err)?;
        }
        write_txn.commit().map_err(backend_err)?;

        Ok(Self { db: Arc::new(db) })
    }

    async fn blocking<F, T>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|err| StoreError::backend(format!("redb task failed: {err}")))?
    }
}

fn backend_err(err: impl std::fmt::Display) -> StoreError {
    StoreError::backend(err.to_string())
}

#[async_trait]
impl KeyValueStore for RedbStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let key = key.to_string();
        self.blocking(move |db| {
            let read_txn = db.begin_read().map_err(backend_err)?;
            let table = read_txn.open_table(HIGHLIGHTS_TABLE).map_err(backend_err)?;
            let value = match table.get(key.as_str()).map_err(backend_err)? {
                Some(bytes) => Some(serde_json::from_slice(bytes.value())?),
                None => None,
            };
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let key = key.to_string();
        let bytes = serde_json::to_vec(&value)?;
        self.blocking(move |db| {
            let write_txn = db.begin_write().map_err(backend_err)?;
            {
                let mut table = write_txn.open_table(HIGHLIGHTS_TABLE).map_err(backend_err)?;
                table
                    .insert(key.as_str(), bytes.as_slice())
                    .map_err(backend_err)?;
            }
            write_txn.commit().map_err(backend_err)
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let key = key.to_string();
        self.blocking(move |db| {
            let write_txn = db.begin_write().map_err(backend_err)?;
            {
                let mut table = write_txn.open_table(HIGHLIGHTS_TABLE).map_err(backend_err)?;
                table.remove(key.as_str()).map_err(backend_err)?;
            }
            write_txn.commit().map_err(backend_err)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn values_survive_reopen() {
        let file = NamedTempFile::new().unwrap();
        {
            let store = RedbStore::open(file.path()).unwrap();
            store
                .set("highlights_https://a.test/x", json!([{"id": "h1"}]))
                .await
                .unwrap();
        }
        let store = RedbStore::open(file.path()).unwrap();
        assert_eq!(
            store.get("highlights_https://a.test/x").await.unwrap(),
            Some(json!([{"id": "h1"}]))
        );
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn remove_deletes_key() {
        let file = NamedTempFile::new().unwrap();
        let store = RedbStore::open(file.path()).unwrap();
        store.set("k", json!([])).await.unwrap();
        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::StoreError;

/// Asynchronous key-value capability the anchor store runs on.
///
/// Values are JSON documents; under every highlight key the value is an
/// array of anchor records.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Fetch several keys at once. Missing keys are absent from the map.
    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, Value>, StoreError> {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.get(key).await? {
                found.insert(key.clone(), value);
            }
        }
        Ok(found)
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(key).await
    }

    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, Value>, StoreError> {
        (**self).get_many(keys).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key).await
    }
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(key).await
    }

    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, Value>, StoreError> {
        (**self).get_many(keys).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key).await
    }
}

/// Selects and builds a storage backend.
///
/// ```
/// use marky_store::BackendConfig;
///
/// let config = BackendConfig::in_memory();
/// assert!(config.build().is_ok());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BackendConfig {
    #[default]
    InMemory,
    /// Redb database file at `path`. Requires the `backend-redb` feature.
    Redb { path: String },
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn redb<P: Into<String>>(path: P) -> Self {
        BackendConfig::Redb { path: path.into() }
    }

    pub fn build(&self) -> Result<Box<dyn KeyValueStore>, StoreError> {
        match self {
            BackendConfig::InMemory => Ok(Box::new(InMemoryStore::new())),
            BackendConfig::Redb { path } => {
                #[cfg(feature = "backend-redb")]
                {
                    Ok(Box::new(RedbStore::open(path)?))
                }
                #[cfg(not(feature = "backend-redb"))]
                {
                    let _ = path;
                    Err(StoreError::backend("redb backend disabled at compile time"))
                }
            }
        }
    }
}

/// `RwLock<HashMap>` store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<String, Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently present, sorted.
    pub fn keys(&self) -> Result<Vec<String>, StoreError> {
        let guard = self
            .records
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        let mut keys: Vec<String> = guard.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let guard = self
            .records
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        Ok(guard.get(key).cloned())
    }

    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, Value>, StoreError> {
        // One read lock for the whole batch.
        let guard = self
            .records
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        Ok(keys
            .iter()
            .filter_map(|key| guard.get(key).map(|value| (key.clone(), value.clone())))
            .collect())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?
            .remove(key);
        Ok(())
    }
}

#[cfg(feature = "backend-redb")]
pub mod redb;

#[cfg(feature = "backend-redb")]
pub use self::redb::RedbStore;

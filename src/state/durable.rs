//! Durable storage seam
//!
//! The storage medium is a plain key to string map. Backends know nothing
//! about the values they hold.

use crate::state::error::PersistenceError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Key-value medium behind the state store
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Serialized record under `key`, `None` on miss
    async fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Replace the record under `key`
    async fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Delete the record under `key`; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// Process-local backend, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

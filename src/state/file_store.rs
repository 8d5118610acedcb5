//! File backend: one JSON document per key
//!
//! Writes go to a uniquely named temporary sibling first and are renamed into
//! place, so a crash mid-write leaves the previous record intact and
//! concurrent writes to one key end with the last rename's complete value.

use crate::state::durable::DurableStore;
use crate::state::error::PersistenceError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Directory of `<key>.json` files
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir`, creating it if needed
    ///
    /// # Arguments
    /// * `dir` - Directory holding one file per key
    ///
    /// # Returns
    /// * `Ok(FileStore)` if the directory exists or was created
    /// * `Err(PersistenceError::Io)` otherwise
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, PersistenceError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        tracing::info!(dir = %dir.display(), "Using file state store");
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(PersistenceError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl DurableStore for FileStore {
    async fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        let tmp = self
            .dir
            .join(format!("{}.{}.tmp", key, uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, value).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        tracing::debug!(key = %key, bytes = value.len(), "Wrote state file");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

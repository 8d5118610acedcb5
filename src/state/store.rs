//! Persisted state store
//!
//! Typed load/store/reset over a `DurableStore`. Reads never fail: a missing
//! record, a backend read error or a record that no longer parses all yield
//! the caller's default. The last two are reported on the diagnostics channel
//! instead of being raised.

use crate::state::durable::{DurableStore, MemoryStore};
use crate::state::error::PersistenceError;
use crate::state::keys::{KeyEntry, StateKey};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

const DIAGNOSTIC_CAPACITY: usize = 64;

/// What went wrong while reading a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A record exists but does not parse as the slot's type
    CorruptRecord,
    /// The backend failed to read the record
    ReadFailed,
}

/// Non-fatal read problem, reported once per occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDiagnostic {
    /// Affected key
    pub key: String,
    /// Problem category
    pub kind: DiagnosticKind,
    /// Parser or backend message
    pub detail: String,
}

/// Keyed durable value cache shared by every task
#[derive(Clone)]
pub struct StateStore {
    backend: Arc<dyn DurableStore>,
    diagnostics: broadcast::Sender<StoreDiagnostic>,
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore").finish_non_exhaustive()
    }
}

impl StateStore {
    /// Store on top of `backend`
    pub fn new(backend: Arc<dyn DurableStore>) -> Self {
        let (diagnostics, _) = broadcast::channel(DIAGNOSTIC_CAPACITY);
        Self {
            backend,
            diagnostics,
        }
    }

    /// Store backed by process memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Receive read diagnostics from now on
    pub fn subscribe_diagnostics(&self) -> broadcast::Receiver<StoreDiagnostic> {
        self.diagnostics.subscribe()
    }

    /// Value under `key`, or `default` when absent or unreadable
    pub async fn load<T: DeserializeOwned>(&self, key: &StateKey<T>, default: T) -> T {
        let raw = match self.backend.read(key.name()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(e) => {
                self.report(key.name(), DiagnosticKind::ReadFailed, e.to_string());
                return default;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                self.report(key.name(), DiagnosticKind::CorruptRecord, e.to_string());
                default
            }
        }
    }

    /// Raw JSON under a registered key, or its default
    ///
    /// A record that parses as JSON but not as the key's registered type is
    /// treated like a corrupt one, matching what a typed `load` would see.
    pub async fn load_entry(&self, entry: &KeyEntry) -> serde_json::Value {
        let default = entry.default_value();
        let value = self.load(&entry.raw_key(), default.clone()).await;
        match entry.validate(&value) {
            Ok(()) => value,
            Err(e) => {
                self.report(entry.name(), DiagnosticKind::CorruptRecord, e);
                default
            }
        }
    }

    /// Serialize `value` and write it under `key`
    pub async fn store<T: Serialize>(
        &self,
        key: &StateKey<T>,
        value: &T,
    ) -> Result<(), PersistenceError> {
        let raw = serde_json::to_string(value)?;
        self.backend.write(key.name(), &raw).await?;
        tracing::debug!(key = %key, bytes = raw.len(), "Stored state");
        Ok(())
    }

    /// Remove the durable record and hand back `default`
    pub async fn reset<T>(&self, key: &StateKey<T>, default: T) -> Result<T, PersistenceError> {
        self.backend.remove(key.name()).await?;
        tracing::debug!(key = %key, "Reset state");
        Ok(default)
    }

    /// In-memory slot initialised from the durable record
    pub async fn slot<T>(&self, key: StateKey<T>, default: T) -> PersistedSlot<T>
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        let value = self.load(&key, default.clone()).await;
        PersistedSlot {
            store: self.clone(),
            key,
            default,
            value,
        }
    }

    fn report(&self, key: &str, kind: DiagnosticKind, detail: String) {
        tracing::warn!(
            key = %key,
            kind = ?kind,
            detail = %detail,
            "Falling back to default state"
        );
        // No subscribers is fine; the warning above is still emitted.
        let _ = self.diagnostics.send(StoreDiagnostic {
            key: key.to_string(),
            kind,
            detail,
        });
    }
}

/// One slot's in-memory value with write-through persistence
#[derive(Debug)]
pub struct PersistedSlot<T> {
    store: StateStore,
    key: StateKey<T>,
    default: T,
    value: T,
}

impl<T> PersistedSlot<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Current value
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Key this slot persists under
    pub fn key(&self) -> StateKey<T> {
        self.key
    }

    /// Replace the value and persist it
    ///
    /// The in-memory value is updated even if the write fails.
    pub async fn set(&mut self, value: T) -> Result<(), PersistenceError> {
        self.value = value;
        self.store.store(&self.key, &self.value).await
    }

    /// Modify the value in place and persist it
    pub async fn update<F>(&mut self, f: F) -> Result<(), PersistenceError>
    where
        F: FnOnce(&mut T),
    {
        f(&mut self.value);
        self.store.store(&self.key, &self.value).await
    }

    /// Back to the default, durable record removed
    pub async fn reset(&mut self) -> Result<(), PersistenceError> {
        self.value = self.default.clone();
        self.store
            .reset(&self.key, self.default.clone())
            .await
            .map(|_| ())
    }
}

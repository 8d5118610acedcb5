// State management module
// Handles persisted task state, durable backends and shared server state

pub mod app_state;
pub mod durable;
pub mod error;
pub mod file_store;
pub mod keys;
pub mod sqlite_store;
pub mod store;

pub use app_state::{open_backend, AppState};
pub use durable::{DurableStore, MemoryStore};
pub use error::PersistenceError;
pub use file_store::FileStore;
pub use keys::StateKey;
pub use sqlite_store::SqliteStore;
pub use store::{DiagnosticKind, PersistedSlot, StateStore, StoreDiagnostic};

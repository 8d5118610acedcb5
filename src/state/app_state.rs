//! Shared server state
//!
//! Everything a request handler needs: the generation client (swappable at
//! runtime through the config endpoint), the state store, the video polling
//! policy, the registry of handles currently being tracked and the image
//! studio's in-memory reference image.

use crate::config::{PersistenceConfig, StoreBackend};
use crate::generation::GenerationClient;
use crate::state::durable::{DurableStore, MemoryStore};
use crate::state::error::PersistenceError;
use crate::state::file_store::FileStore;
use crate::state::sqlite_store::SqliteStore;
use crate::state::store::StateStore;
use crate::tasks::image_studio::SourceImage;
use crate::tracker::{TrackerPolicy, TrackerRegistry};
use std::sync::Arc;
use tokio::sync::RwLock;

/// State shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    client: Arc<RwLock<GenerationClient>>,
    store: StateStore,
    policy: TrackerPolicy,
    registry: TrackerRegistry,
    image_source: SourceImage,
}

impl AppState {
    /// Assemble state from its parts
    pub fn new(client: GenerationClient, store: StateStore, policy: TrackerPolicy) -> Self {
        Self {
            client: Arc::new(RwLock::new(client)),
            store,
            policy,
            registry: TrackerRegistry::new(),
            image_source: SourceImage::new(),
        }
    }

    /// Current generation client
    ///
    /// Clones are cheap and keep working if the client is replaced meanwhile.
    pub async fn client(&self) -> GenerationClient {
        self.client.read().await.clone()
    }

    /// Swap in a reconfigured client for subsequent requests
    pub async fn replace_client(&self, client: GenerationClient) {
        *self.client.write().await = client;
    }

    /// Persisted task state
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Video polling policy
    pub fn policy(&self) -> TrackerPolicy {
        self.policy
    }

    /// Handles with an active tracker
    pub fn registry(&self) -> &TrackerRegistry {
        &self.registry
    }

    /// Reference image shared by image studio requests
    pub fn image_source(&self) -> &SourceImage {
        &self.image_source
    }
}

/// Open the configured durable backend
///
/// # Errors
/// * `PersistenceError` if the directory or database cannot be created
pub async fn open_backend(
    config: &PersistenceConfig,
) -> Result<Arc<dyn DurableStore>, PersistenceError> {
    let backend: Arc<dyn DurableStore> = match config.backend {
        StoreBackend::File => Arc::new(FileStore::new(config.state_dir())?),
        StoreBackend::Sqlite => {
            let path = config.database_path();
            Arc::new(SqliteStore::new(&path.to_string_lossy()).await?)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory state store; nothing will survive a restart");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(backend)
}

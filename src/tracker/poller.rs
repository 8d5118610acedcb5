//! Seam between the tracker and the service

use crate::generation::{GenerationClient, GenerationError, Operation};
use async_trait::async_trait;

/// The two calls a tracker needs from the generation client
#[async_trait]
pub trait OperationPoller: Send + Sync {
    /// One status check, returning the next snapshot
    async fn poll(&self, operation: &Operation) -> Result<Operation, GenerationError>;

    /// Fetchable URL for a DONE snapshot
    fn download_url(&self, operation: &Operation) -> Result<String, GenerationError>;
}

#[async_trait]
impl OperationPoller for GenerationClient {
    async fn poll(&self, operation: &Operation) -> Result<Operation, GenerationError> {
        self.poll_operation(operation).await
    }

    fn download_url(&self, operation: &Operation) -> Result<String, GenerationError> {
        self.resolve_download_url(operation)
    }
}

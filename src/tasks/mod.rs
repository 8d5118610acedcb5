//! Task orchestrators
//!
//! One orchestrator per content task. Each owns a pair of persisted slots
//! (form inputs and last result), builds the prompt for its task, calls the
//! generation client and writes the result back. A reset clears inputs and
//! results as two separate writes.

pub mod copywriting;
pub mod image_studio;
pub mod lead_gen;
pub mod product_fission;
pub mod product_listing;
pub mod settings;
pub mod video_script;

use crate::generation::{GenerationError, Schema, StructuredResult};
use crate::state::{PersistenceError, StateKey, StateStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// The inputs/results slot pair of one task
#[derive(Debug, Clone)]
pub struct TaskSlots<I, R> {
    store: StateStore,
    inputs: StateKey<I>,
    results: StateKey<R>,
}

impl<I, R> TaskSlots<I, R>
where
    I: Serialize + DeserializeOwned + Default,
    R: Serialize + DeserializeOwned + Default,
{
    /// Bind a task's keys to `store`
    pub fn new(store: StateStore, inputs: StateKey<I>, results: StateKey<R>) -> Self {
        Self {
            store,
            inputs,
            results,
        }
    }

    /// Underlying store
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Persisted inputs, or the default form
    pub async fn inputs(&self) -> I {
        self.store.load(&self.inputs, I::default()).await
    }

    /// Persist the form
    pub async fn set_inputs(&self, inputs: &I) -> Result<(), PersistenceError> {
        self.store.store(&self.inputs, inputs).await
    }

    /// Persisted results, or the empty result
    pub async fn results(&self) -> R {
        self.store.load(&self.results, R::default()).await
    }

    /// Persist a result
    pub async fn set_results(&self, results: &R) -> Result<(), PersistenceError> {
        self.store.store(&self.results, results).await
    }

    /// Clear inputs, then results
    ///
    /// The results are cleared even if clearing the inputs failed; the first
    /// error is returned.
    pub async fn reset(&self) -> Result<(), PersistenceError> {
        let inputs = self.store.reset(&self.inputs, I::default()).await;
        let results = self.store.reset(&self.results, R::default()).await;
        inputs.and(results).map(|_| ())
    }
}

/// Check a structured reply against `schema` and convert it to `T`
///
/// The client only guarantees syntactic JSON; tasks that depend on every
/// required field being present go through here.
pub(crate) fn parse_required<T: DeserializeOwned>(
    schema: &Schema,
    result: StructuredResult<Value>,
) -> Result<T, GenerationError> {
    if let Err(message) = schema.validate_required(&result.value) {
        return Err(GenerationError::SchemaParse {
            message,
            raw: result.raw,
        });
    }
    serde_json::from_value(result.value).map_err(|e| GenerationError::SchemaParse {
        message: e.to_string(),
        raw: result.raw,
    })
}

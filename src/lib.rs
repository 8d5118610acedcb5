//! Content Studio Library
//!
//! Generation orchestration for marketing content: a uniform client for the
//! generative service, a tracker for long-running video jobs, a persisted
//! per-task state store and the task orchestrators built on them.
//! The server binary is in `src/main.rs`.

pub mod api;
pub mod config;
pub mod error;
pub mod generation;
/// Persisted task state
///
/// Handles durable backends, typed keys and the shared server state.
pub mod state;
pub mod tasks;
pub mod tracker;

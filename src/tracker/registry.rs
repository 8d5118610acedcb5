//! Handle registry
//!
//! At most one tracker may drive a given operation handle at a time. A claim
//! is held for as long as its guard lives.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Set of handles currently being tracked
#[derive(Debug, Clone, Default)]
pub struct TrackerRegistry {
    active: Arc<Mutex<HashSet<String>>>,
}

impl TrackerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `handle`; `None` if another tracker already holds it
    pub fn claim(&self, handle: &str) -> Option<HandleClaim> {
        let mut active = self.lock();
        if !active.insert(handle.to_string()) {
            tracing::debug!(handle = %handle, "Handle already being tracked");
            return None;
        }
        Some(HandleClaim {
            handle: handle.to_string(),
            active: Arc::clone(&self.active),
        })
    }

    /// Whether `handle` is currently claimed
    pub fn is_active(&self, handle: &str) -> bool {
        self.lock().contains(handle)
    }

    /// Number of claimed handles
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no handle is claimed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // Poisoning is ignored, inserts and removes are single steps.
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Exclusive claim on one handle, released on drop
#[derive(Debug)]
pub struct HandleClaim {
    handle: String,
    active: Arc<Mutex<HashSet<String>>>,
}

impl HandleClaim {
    /// Claimed handle
    pub fn handle(&self) -> &str {
        &self.handle
    }
}

impl Drop for HandleClaim {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        active.remove(&self.handle);
    }
}

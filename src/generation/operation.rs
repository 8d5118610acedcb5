//! Video operation snapshot
//!
//! An `Operation` is an immutable-by-convention snapshot of a long-running
//! video job. Polling never mutates a snapshot in place; it produces a new one.

use crate::generation::error::GenerationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a video job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    /// Accepted by the service, tracking not started yet
    Initiated,
    /// Being polled
    Polling,
    /// Finished with a result location
    Done,
    /// Finished without a usable result, or tracking failed
    Failed,
}

impl OperationStatus {
    /// Whether no further transitions are possible
    pub fn is_terminal(self) -> bool {
        matches!(self, OperationStatus::Done | OperationStatus::Failed)
    }

    /// Forward-only transition table
    ///
    /// INITIATED -> POLLING | FAILED, POLLING -> POLLING | DONE | FAILED.
    /// Terminal states never move.
    pub fn can_transition_to(self, next: OperationStatus) -> bool {
        use OperationStatus::*;
        matches!(
            (self, next),
            (Initiated, Polling)
                | (Initiated, Failed)
                | (Polling, Polling)
                | (Polling, Done)
                | (Polling, Failed)
        )
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OperationStatus::Initiated => "INITIATED",
            OperationStatus::Polling => "POLLING",
            OperationStatus::Done => "DONE",
            OperationStatus::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

/// Snapshot of a video generation job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Opaque service handle (operation resource name)
    pub handle: String,
    /// Current lifecycle status
    pub status: OperationStatus,
    /// Raw media URI once the job is DONE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_location: Option<String>,
    /// Failure detail once the job is FAILED
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Number of status checks performed so far
    #[serde(default)]
    pub polls: u32,
    /// When the service accepted the job
    pub created_at: DateTime<Utc>,
    /// When this snapshot was produced
    pub updated_at: DateTime<Utc>,
}

impl Operation {
    /// Snapshot for a job the service just accepted
    pub fn initiated(handle: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            handle: handle.into(),
            status: OperationStatus::Initiated,
            result_location: None,
            error: None,
            polls: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Produce the next snapshot with `next` status
    ///
    /// Returns `InvalidTransition` for anything the state machine forbids.
    pub fn advance(&self, next: OperationStatus) -> Result<Operation, GenerationError> {
        if !self.status.can_transition_to(next) {
            return Err(GenerationError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        let mut snapshot = self.clone();
        snapshot.status = next;
        snapshot.updated_at = Utc::now();
        Ok(snapshot)
    }

    /// Next snapshot after a failure, keeping the failure detail
    ///
    /// Terminal snapshots are returned unchanged.
    pub fn failed(&self, error: impl Into<String>) -> Operation {
        if self.status.is_terminal() {
            return self.clone();
        }
        let mut snapshot = self.clone();
        snapshot.status = OperationStatus::Failed;
        snapshot.error = Some(error.into());
        snapshot.updated_at = Utc::now();
        snapshot
    }

    /// Whether the job has reached DONE or FAILED
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_only() {
        use OperationStatus::*;
        assert!(Initiated.can_transition_to(Polling));
        assert!(Polling.can_transition_to(Polling));
        assert!(Polling.can_transition_to(Done));
        assert!(Polling.can_transition_to(Failed));
        assert!(!Polling.can_transition_to(Initiated));
        assert!(!Done.can_transition_to(Polling));
        assert!(!Failed.can_transition_to(Done));
        assert!(!Initiated.can_transition_to(Done));
    }

    #[test]
    fn test_advance_produces_new_snapshot() {
        let op = Operation::initiated("models/veo/operations/abc");
        let next = op.advance(OperationStatus::Polling).unwrap();
        assert_eq!(op.status, OperationStatus::Initiated);
        assert_eq!(next.status, OperationStatus::Polling);
        assert_eq!(next.handle, op.handle);
    }

    #[test]
    fn test_advance_rejects_backward_move() {
        let op = Operation::initiated("h")
            .advance(OperationStatus::Polling)
            .unwrap()
            .advance(OperationStatus::Done)
            .unwrap();
        let err = op.advance(OperationStatus::Polling).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidTransition { .. }));
    }

    #[test]
    fn test_failed_keeps_terminal_snapshot() {
        let done = Operation::initiated("h")
            .advance(OperationStatus::Polling)
            .unwrap()
            .advance(OperationStatus::Done)
            .unwrap();
        let still_done = done.failed("late error");
        assert_eq!(still_done.status, OperationStatus::Done);
        assert!(still_done.error.is_none());
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        let json = serde_json::to_string(&OperationStatus::Polling).unwrap();
        assert_eq!(json, "\"POLLING\"");
    }
}

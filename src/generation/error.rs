//! Generation-specific error types
//!
//! Errors raised by the generation client and the operation tracker. None of
//! these are retried anywhere in the core; they surface to the immediate caller.

use crate::generation::operation::OperationStatus;
use std::fmt;
use thiserror::Error;

/// Classification of a failure reported by (or while reaching) the external service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// The request never produced an HTTP response (DNS, connect, timeout, body read)
    Transport,
    /// Missing, empty or rejected credentials (HTTP 401/403)
    Unauthorized,
    /// The service throttled the request (HTTP 429)
    RateLimited,
    /// The service refused the request (other non-2xx status, blocked prompt)
    Rejected,
    /// The service answered 2xx but the envelope could not be decoded
    InvalidResponse,
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServiceErrorKind::Transport => "transport failure",
            ServiceErrorKind::Unauthorized => "unauthorized",
            ServiceErrorKind::RateLimited => "rate limited",
            ServiceErrorKind::Rejected => "rejected",
            ServiceErrorKind::InvalidResponse => "invalid response",
        };
        f.write_str(label)
    }
}

/// Errors that can occur while generating content or tracking a video job
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Transport, authentication or service-side rejection
    #[error("Service error ({kind}): {message}")]
    Service {
        /// What went wrong
        kind: ServiceErrorKind,
        /// HTTP status, when one was received
        status: Option<u16>,
        /// Human-readable detail (includes the service body when available)
        message: String,
    },

    /// A structured response could not be deserialized
    #[error("Failed to parse structured response: {message}")]
    SchemaParse {
        /// Parser diagnostic
        message: String,
        /// Raw text returned by the service
        raw: String,
    },

    /// A caller-side precondition was violated; nothing was dispatched
    #[error("Validation error: {0}")]
    Validation(String),

    /// A video job ended in a non-success terminal state
    #[error("Operation {handle} failed: {reason}")]
    OperationFailure {
        /// Service handle of the job
        handle: String,
        /// Why the job failed
        reason: FailureReason,
    },

    /// An attempt to move an operation backwards through its lifecycle
    #[error("Invalid operation transition from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: OperationStatus,
        /// Requested status
        to: OperationStatus,
    },
}

/// Detail recorded on a snapshot that finished without a video
pub const NO_RESULT_DETAIL: &str = "job finished without a video";

/// Why a tracked operation reached FAILED
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The service reported an error for the job
    Service(String),
    /// The job finished without producing a video
    NoResult,
    /// A poll call itself raised
    PollFailed(String),
    /// The tracker policy ran out of attempts or time
    TimedOut(String),
    /// The caller cancelled tracking
    Cancelled,
    /// Status was not DONE, or DONE without a location, when a URL was requested
    NotReady(String),
    /// Another tracker already follows this handle
    AlreadyTracked,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Service(msg) => write!(f, "service reported failure: {}", msg),
            FailureReason::NoResult => f.write_str(NO_RESULT_DETAIL),
            FailureReason::PollFailed(msg) => write!(f, "status check failed: {}", msg),
            FailureReason::TimedOut(msg) => write!(f, "timed out: {}", msg),
            FailureReason::Cancelled => f.write_str("tracking cancelled"),
            FailureReason::NotReady(msg) => write!(f, "result not available: {}", msg),
            FailureReason::AlreadyTracked => f.write_str("already being tracked"),
        }
    }
}

impl FailureReason {
    /// Reason for a snapshot the service itself marked FAILED
    pub fn from_snapshot_error(detail: Option<&str>) -> Self {
        match detail {
            Some(detail) if detail != NO_RESULT_DETAIL => FailureReason::Service(detail.to_string()),
            _ => FailureReason::NoResult,
        }
    }
}

impl GenerationError {
    pub(crate) fn service(
        kind: ServiceErrorKind,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        GenerationError::Service {
            kind,
            status,
            message: message.into(),
        }
    }

    pub(crate) fn operation(handle: impl Into<String>, reason: FailureReason) -> Self {
        GenerationError::OperationFailure {
            handle: handle.into(),
            reason,
        }
    }

    /// True when the error is an operation that ran out of attempts or time
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            GenerationError::OperationFailure {
                reason: FailureReason::TimedOut(_),
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_message_includes_kind() {
        let err = GenerationError::service(ServiceErrorKind::RateLimited, Some(429), "slow down");
        let msg = err.to_string();
        assert!(msg.contains("rate limited"));
        assert!(msg.contains("slow down"));
    }

    #[test]
    fn test_reason_from_snapshot_error() {
        assert_eq!(
            FailureReason::from_snapshot_error(Some(NO_RESULT_DETAIL)),
            FailureReason::NoResult
        );
        assert_eq!(
            FailureReason::from_snapshot_error(Some("quota")),
            FailureReason::Service("quota".to_string())
        );
        assert_eq!(FailureReason::from_snapshot_error(None), FailureReason::NoResult);
    }

    #[test]
    fn test_timeout_detection() {
        let err = GenerationError::operation("ops/1", FailureReason::TimedOut("3 polls".into()));
        assert!(err.is_timeout());
        let err = GenerationError::operation("ops/1", FailureReason::NoResult);
        assert!(!err.is_timeout());
    }
}

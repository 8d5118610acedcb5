//! Single-job tracker
//!
//! Drives one operation from INITIATED to DONE or FAILED:
//!
//! ```text
//! INITIATED --> POLLING --(done=false)--> POLLING
//!                       --(done, video)--> DONE   -> resolve download URL
//!                       --(done, none)---> FAILED
//! any       --(poll error, bound hit, cancelled)--> FAILED
//! ```
//!
//! Every snapshot is published on a watch channel so callers can follow
//! progress without sharing the snapshot itself.

use crate::generation::{FailureReason, GenerationError, Operation, OperationStatus};
use crate::tracker::poller::OperationPoller;
use crate::tracker::policy::TrackerPolicy;
use crate::tracker::registry::HandleClaim;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// A finished video with its fetchable location
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedVideo {
    /// Final DONE snapshot
    pub operation: Operation,
    /// Download URL with the credential appended
    pub download_url: String,
}

/// Tracker owning exactly one operation snapshot
pub struct OperationTracker {
    poller: Arc<dyn OperationPoller>,
    policy: TrackerPolicy,
    operation: Operation,
    updates: watch::Sender<Operation>,
    _claim: Option<HandleClaim>,
}

impl OperationTracker {
    /// Create a tracker for `operation`
    pub fn new(
        poller: Arc<dyn OperationPoller>,
        operation: Operation,
        policy: TrackerPolicy,
    ) -> Self {
        let (updates, _) = watch::channel(operation.clone());
        Self {
            poller,
            policy,
            operation,
            updates,
            _claim: None,
        }
    }

    /// Hold `claim` until tracking finishes
    pub fn with_claim(mut self, claim: HandleClaim) -> Self {
        self._claim = Some(claim);
        self
    }

    /// Receive every snapshot the tracker produces
    pub fn subscribe(&self) -> watch::Receiver<Operation> {
        self.updates.subscribe()
    }

    /// Latest snapshot
    pub fn snapshot(&self) -> &Operation {
        &self.operation
    }

    /// Poll until terminal, then resolve the download URL
    ///
    /// # Errors
    /// * `OperationFailure` if the job fails, a poll raises, a policy bound is
    ///   hit or `cancel` fires; the last published snapshot is FAILED
    pub async fn track(mut self, cancel: CancellationToken) -> Result<TrackedVideo, GenerationError> {
        let started = Instant::now();
        tracing::info!(
            handle = %self.operation.handle,
            status = %self.operation.status,
            "Tracking video job"
        );

        if self.operation.status == OperationStatus::Initiated {
            let polling = self.operation.advance(OperationStatus::Polling)?;
            self.publish(polling);
        }

        loop {
            match self.operation.status {
                OperationStatus::Done => return self.finish(),
                OperationStatus::Failed => {
                    let reason = FailureReason::from_snapshot_error(self.operation.error.as_deref());
                    return Err(self.fail_with(reason));
                }
                OperationStatus::Initiated | OperationStatus::Polling => {}
            }

            if let Some(max) = self.policy.max_attempts {
                if self.operation.polls >= max {
                    let reason =
                        FailureReason::TimedOut(format!("no result after {} status checks", max));
                    return Err(self.fail(reason));
                }
            }
            if let Some(max) = self.policy.max_elapsed {
                if started.elapsed() >= max {
                    let reason = FailureReason::TimedOut(format!(
                        "no result after {} seconds",
                        max.as_secs()
                    ));
                    return Err(self.fail(reason));
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(self.fail(FailureReason::Cancelled));
                }
                _ = tokio::time::sleep(self.policy.poll_interval) => {}
            }

            match self.poller.poll(&self.operation).await {
                Ok(next) => {
                    tracing::debug!(
                        handle = %next.handle,
                        status = %next.status,
                        polls = next.polls,
                        "Video job status"
                    );
                    self.publish(next);
                }
                Err(e) => {
                    tracing::warn!(
                        handle = %self.operation.handle,
                        error = %e,
                        "Status check failed"
                    );
                    return Err(self.fail(FailureReason::PollFailed(e.to_string())));
                }
            }
        }
    }

    /// Resolve the URL of a DONE snapshot
    ///
    /// Resolution failures surface as `OperationFailure`; the snapshot stays
    /// DONE since the job itself finished.
    fn finish(self) -> Result<TrackedVideo, GenerationError> {
        let download_url = match self.poller.download_url(&self.operation) {
            Ok(url) => url,
            Err(GenerationError::OperationFailure { reason, .. }) => {
                return Err(self.fail_with(reason))
            }
            Err(e) => return Err(self.fail_with(FailureReason::NotReady(e.to_string()))),
        };
        tracing::info!(
            handle = %self.operation.handle,
            polls = self.operation.polls,
            "Video job complete"
        );
        Ok(TrackedVideo {
            operation: self.operation,
            download_url,
        })
    }

    /// Move to FAILED with `reason` recorded on the snapshot
    fn fail(&mut self, reason: FailureReason) -> GenerationError {
        let failed = self.operation.failed(reason.to_string());
        self.publish(failed);
        self.fail_with(reason)
    }

    fn fail_with(&self, reason: FailureReason) -> GenerationError {
        tracing::warn!(
            handle = %self.operation.handle,
            reason = %reason,
            "Video job failed"
        );
        GenerationError::operation(&self.operation.handle, reason)
    }

    fn publish(&mut self, operation: Operation) {
        self.updates.send_replace(operation.clone());
        self.operation = operation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ServiceErrorKind;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    enum Step {
        Pending,
        Done(&'static str),
        Raise,
    }

    struct ScriptedPoller {
        steps: Mutex<VecDeque<Step>>,
    }

    impl ScriptedPoller {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
            })
        }
    }

    #[async_trait]
    impl OperationPoller for ScriptedPoller {
        async fn poll(&self, operation: &Operation) -> Result<Operation, GenerationError> {
            let step = self.steps.lock().unwrap().pop_front().unwrap_or(Step::Pending);
            let mut next = operation.clone();
            next.polls += 1;
            match step {
                Step::Pending => next.advance(OperationStatus::Polling),
                Step::Done(uri) => {
                    let mut done = next.advance(OperationStatus::Done)?;
                    done.result_location = Some(uri.to_string());
                    Ok(done)
                }
                Step::Raise => Err(GenerationError::Service {
                    kind: ServiceErrorKind::Transport,
                    status: None,
                    message: "connection reset".to_string(),
                }),
            }
        }

        fn download_url(&self, operation: &Operation) -> Result<String, GenerationError> {
            Ok(format!(
                "{}?key=test",
                operation.result_location.clone().unwrap_or_default()
            ))
        }
    }

    fn fast_policy() -> TrackerPolicy {
        TrackerPolicy::unbounded(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_tracks_to_done_and_resolves() {
        let poller = ScriptedPoller::new(vec![
            Step::Pending,
            Step::Pending,
            Step::Pending,
            Step::Done("X"),
        ]);
        let tracker = OperationTracker::new(poller, Operation::initiated("ops/1"), fast_policy());
        let video = tracker.track(CancellationToken::new()).await.unwrap();

        assert_eq!(video.operation.status, OperationStatus::Done);
        assert_eq!(video.operation.polls, 4);
        assert_eq!(video.download_url, "X?key=test");
    }

    #[tokio::test]
    async fn test_poll_error_becomes_failed() {
        let poller = ScriptedPoller::new(vec![Step::Pending, Step::Raise]);
        let tracker = OperationTracker::new(poller, Operation::initiated("ops/2"), fast_policy());
        let updates = tracker.subscribe();

        let err = tracker.track(CancellationToken::new()).await.unwrap_err();

        assert!(matches!(
            err,
            GenerationError::OperationFailure {
                reason: FailureReason::PollFailed(_),
                ..
            }
        ));
        assert_eq!(updates.borrow().status, OperationStatus::Failed);
    }

    #[tokio::test]
    async fn test_attempt_bound_times_out() {
        let poller = ScriptedPoller::new(vec![]);
        let policy = TrackerPolicy {
            poll_interval: Duration::from_millis(1),
            max_attempts: Some(3),
            max_elapsed: None,
        };
        let tracker = OperationTracker::new(poller, Operation::initiated("ops/3"), policy);
        let updates = tracker.subscribe();

        let err = tracker.track(CancellationToken::new()).await.unwrap_err();

        assert!(err.is_timeout());
        let last = updates.borrow().clone();
        assert_eq!(last.status, OperationStatus::Failed);
        assert_eq!(last.polls, 3);
    }

    #[tokio::test]
    async fn test_cancellation_stops_tracking() {
        let poller = ScriptedPoller::new(vec![]);
        let policy = TrackerPolicy::unbounded(Duration::from_secs(3600));
        let tracker = OperationTracker::new(poller, Operation::initiated("ops/4"), policy);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = tracker.track(cancel).await.unwrap_err();
        assert!(matches!(
            err,
            GenerationError::OperationFailure {
                reason: FailureReason::Cancelled,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_already_failed_snapshot_is_reported() {
        let poller = ScriptedPoller::new(vec![]);
        let failed = Operation::initiated("ops/5").failed("quota exceeded");
        let tracker = OperationTracker::new(poller, failed, fast_policy());

        let err = tracker.track(CancellationToken::new()).await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    struct KeylessPoller;

    #[async_trait]
    impl OperationPoller for KeylessPoller {
        async fn poll(&self, operation: &Operation) -> Result<Operation, GenerationError> {
            let mut done = operation.advance(OperationStatus::Done)?;
            done.polls += 1;
            done.result_location = Some("https://media/z".to_string());
            Ok(done)
        }

        fn download_url(&self, _operation: &Operation) -> Result<String, GenerationError> {
            Err(GenerationError::Service {
                kind: ServiceErrorKind::Unauthorized,
                status: None,
                message: "API key is empty".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_unresolvable_url_is_operation_failure() {
        let tracker = OperationTracker::new(
            Arc::new(KeylessPoller),
            Operation::initiated("ops/7"),
            fast_policy(),
        );
        let updates = tracker.subscribe();

        let err = tracker.track(CancellationToken::new()).await.unwrap_err();

        match err {
            GenerationError::OperationFailure {
                reason: FailureReason::NotReady(detail),
                ..
            } => assert!(detail.contains("API key is empty")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(updates.borrow().status, OperationStatus::Done);
    }

    #[tokio::test]
    async fn test_status_never_moves_backward() {
        let poller = ScriptedPoller::new(vec![Step::Pending, Step::Done("Y")]);
        let tracker = OperationTracker::new(poller, Operation::initiated("ops/6"), fast_policy());
        let mut updates = tracker.subscribe();

        let observer = tokio::spawn(async move {
            let mut seen = vec![updates.borrow().status];
            while updates.changed().await.is_ok() {
                seen.push(updates.borrow().status);
            }
            seen
        });

        tracker.track(CancellationToken::new()).await.unwrap();
        let seen = observer.await.unwrap();

        for pair in seen.windows(2) {
            assert!(
                pair[0] == pair[1] || pair[0].can_transition_to(pair[1]),
                "backward move {:?}",
                pair
            );
        }
        assert_eq!(seen.last(), Some(&OperationStatus::Done));
    }
}

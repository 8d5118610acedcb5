//! Batch supervisor
//!
//! Runs several independent trackers side by side on the current task and
//! aggregates their progress. Trackers share nothing except the poller; each
//! keeps its own snapshot.

use crate::generation::{GenerationError, Operation};
use crate::tracker::job::{OperationTracker, TrackedVideo};
use crate::tracker::poller::OperationPoller;
use crate::tracker::policy::TrackerPolicy;
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Aggregate progress of a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    /// Jobs in the batch
    pub total: usize,
    /// Jobs that reached DONE
    pub done: usize,
    /// Jobs that reached FAILED
    pub failed: usize,
}

impl BatchProgress {
    /// Jobs still being tracked
    pub fn pending(&self) -> usize {
        self.total.saturating_sub(self.done + self.failed)
    }

    /// Whether every job has finished
    pub fn is_complete(&self) -> bool {
        self.pending() == 0
    }
}

/// Supervises a batch of video jobs
pub struct BatchSupervisor {
    poller: Arc<dyn OperationPoller>,
    policy: TrackerPolicy,
    progress: watch::Sender<BatchProgress>,
}

impl BatchSupervisor {
    /// Create a supervisor sharing one poller and policy across jobs
    pub fn new(poller: Arc<dyn OperationPoller>, policy: TrackerPolicy) -> Self {
        let (progress, _) = watch::channel(BatchProgress::default());
        Self {
            poller,
            policy,
            progress,
        }
    }

    /// Receive progress updates
    pub fn subscribe(&self) -> watch::Receiver<BatchProgress> {
        self.progress.subscribe()
    }

    /// Tracker for one job of the batch, sharing the batch's poller and policy
    pub fn tracker(&self, operation: Operation) -> OperationTracker {
        OperationTracker::new(Arc::clone(&self.poller), operation, self.policy)
    }

    /// Track every job to completion
    ///
    /// Each entry is either a tracker or the error that kept its job from
    /// starting; the latter count toward `total` and `failed` right away.
    /// Outcomes are returned in input order. One job failing does not stop
    /// the others; cancelling `cancel` stops all of them.
    pub async fn track_all(
        &self,
        jobs: Vec<Result<OperationTracker, GenerationError>>,
        cancel: CancellationToken,
    ) -> Vec<Result<TrackedVideo, GenerationError>> {
        let total = jobs.len();
        let unstarted = jobs.iter().filter(|job| job.is_err()).count();
        self.progress.send_replace(BatchProgress {
            total,
            failed: unstarted,
            ..Default::default()
        });
        tracing::info!(total = total, unstarted = unstarted, "Tracking video batch");

        let jobs = jobs.into_iter().map(|job| {
            let cancel = cancel.child_token();
            async move {
                let tracker = job?;
                let outcome = tracker.track(cancel).await;
                self.progress.send_modify(|progress| match &outcome {
                    Ok(_) => progress.done += 1,
                    Err(_) => progress.failed += 1,
                });
                outcome
            }
        });

        let outcomes = join_all(jobs).await;
        let progress = *self.progress.borrow();
        tracing::info!(
            total = progress.total,
            done = progress.done,
            failed = progress.failed,
            "Video batch finished"
        );
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{FailureReason, OperationStatus};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Finishes jobs whose handle ends in "ok" after two checks, fails the rest
    struct HandlePoller;

    #[async_trait]
    impl OperationPoller for HandlePoller {
        async fn poll(&self, operation: &Operation) -> Result<Operation, GenerationError> {
            let mut next = operation.advance(OperationStatus::Polling)?;
            next.polls += 1;
            if next.polls < 2 {
                return Ok(next);
            }
            if operation.handle.ends_with("ok") {
                let mut done = next.advance(OperationStatus::Done)?;
                done.result_location = Some(format!("https://media/{}", operation.handle));
                Ok(done)
            } else {
                Ok(next.failed("unsafe content"))
            }
        }

        fn download_url(&self, operation: &Operation) -> Result<String, GenerationError> {
            Ok(operation.result_location.clone().unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn test_outcomes_in_input_order_with_progress() {
        let supervisor = BatchSupervisor::new(
            Arc::new(HandlePoller),
            TrackerPolicy::unbounded(Duration::from_millis(1)),
        );
        let progress = supervisor.subscribe();
        let jobs = ["scene-1-ok", "scene-2-bad", "scene-3-ok"]
            .into_iter()
            .map(|handle| Ok(supervisor.tracker(Operation::initiated(handle))))
            .collect();

        let outcomes = supervisor.track_all(jobs, CancellationToken::new()).await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(
            outcomes[0].as_ref().unwrap().download_url,
            "https://media/scene-1-ok"
        );
        assert!(matches!(
            outcomes[1],
            Err(GenerationError::OperationFailure {
                reason: FailureReason::Service(_),
                ..
            })
        ));
        assert!(outcomes[2].is_ok());

        let last = *progress.borrow();
        assert_eq!(
            last,
            BatchProgress {
                total: 3,
                done: 2,
                failed: 1
            }
        );
        assert!(last.is_complete());
    }

    #[tokio::test]
    async fn test_unstarted_jobs_count_toward_total() {
        let supervisor = BatchSupervisor::new(
            Arc::new(HandlePoller),
            TrackerPolicy::unbounded(Duration::from_millis(1)),
        );
        let progress = supervisor.subscribe();
        let jobs = vec![
            Err(GenerationError::Validation("quota".to_string())),
            Ok(supervisor.tracker(Operation::initiated("scene-2-ok"))),
        ];

        let outcomes = supervisor.track_all(jobs, CancellationToken::new()).await;

        assert!(matches!(outcomes[0], Err(GenerationError::Validation(_))));
        assert!(outcomes[1].is_ok());
        assert_eq!(
            *progress.borrow(),
            BatchProgress {
                total: 2,
                done: 1,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn test_claims_released_when_batch_finishes() {
        let registry = crate::tracker::TrackerRegistry::new();
        let supervisor = BatchSupervisor::new(
            Arc::new(HandlePoller),
            TrackerPolicy::unbounded(Duration::from_millis(1)),
        );
        let claim = registry.claim("scene-1-ok").unwrap();
        let jobs = vec![Ok(supervisor
            .tracker(Operation::initiated("scene-1-ok"))
            .with_claim(claim))];
        assert!(registry.is_active("scene-1-ok"));

        supervisor.track_all(jobs, CancellationToken::new()).await;

        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let supervisor = BatchSupervisor::new(Arc::new(HandlePoller), TrackerPolicy::default());
        let outcomes = supervisor
            .track_all(Vec::new(), CancellationToken::new())
            .await;
        assert!(outcomes.is_empty());
        assert!(supervisor.subscribe().borrow().is_complete());
    }
}

//! Operation tracker
//!
//! Follows long-running video jobs until they finish. A tracker owns one
//! operation snapshot and polls it at a fixed interval within the bounds of
//! its `TrackerPolicy`; the registry prevents two trackers from driving the
//! same handle and the batch supervisor runs many trackers side by side.

pub mod batch;
pub mod job;
pub mod poller;
pub mod policy;
pub mod registry;

pub use batch::{BatchProgress, BatchSupervisor};
pub use job::{OperationTracker, TrackedVideo};
pub use poller::OperationPoller;
pub use policy::TrackerPolicy;
pub use registry::{HandleClaim, TrackerRegistry};

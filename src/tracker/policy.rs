//! Polling policy for video jobs

use serde::Serialize;
use std::env;
use std::time::Duration;

/// Delay between status checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Status checks before a job is declared timed out
pub const DEFAULT_MAX_ATTEMPTS: u32 = 90;

/// Wall-clock budget for one job
pub const DEFAULT_MAX_ELAPSED: Duration = Duration::from_secs(20 * 60);

/// How a tracker paces and bounds its polling
///
/// The delay is fixed; there is no backoff. A `None` bound is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackerPolicy {
    /// Fixed delay before each status check
    pub poll_interval: Duration,
    /// Maximum number of status checks
    pub max_attempts: Option<u32>,
    /// Maximum time spent tracking
    pub max_elapsed: Option<Duration>,
}

impl Default for TrackerPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            max_elapsed: Some(DEFAULT_MAX_ELAPSED),
        }
    }
}

impl TrackerPolicy {
    /// Defaults overridden by `VIDEO_POLL_INTERVAL_SECS`, `VIDEO_MAX_POLLS`
    /// and `VIDEO_MAX_WAIT_SECS`; a zero bound disables it
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let poll_interval = read_u64("VIDEO_POLL_INTERVAL_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_interval);

        let max_attempts = match read_u64("VIDEO_MAX_POLLS") {
            Some(0) => None,
            Some(n) => Some(u32::try_from(n).unwrap_or(u32::MAX)),
            None => defaults.max_attempts,
        };

        let max_elapsed = match read_u64("VIDEO_MAX_WAIT_SECS") {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.max_elapsed,
        };

        Self {
            poll_interval,
            max_attempts,
            max_elapsed,
        }
    }

    /// Policy without bounds, polling until a terminal status
    pub fn unbounded(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            max_attempts: None,
            max_elapsed: None,
        }
    }
}

fn read_u64(var: &str) -> Option<u64> {
    env::var(var).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_policy() {
        let policy = TrackerPolicy::default();
        assert_eq!(policy.poll_interval, Duration::from_secs(10));
        assert_eq!(policy.max_attempts, Some(90));
    }

    #[test]
    #[serial]
    fn test_from_env_zero_disables_bound() {
        env::set_var("VIDEO_POLL_INTERVAL_SECS", "2");
        env::set_var("VIDEO_MAX_POLLS", "0");
        env::set_var("VIDEO_MAX_WAIT_SECS", "30");

        let policy = TrackerPolicy::from_env();

        env::remove_var("VIDEO_POLL_INTERVAL_SECS");
        env::remove_var("VIDEO_MAX_POLLS");
        env::remove_var("VIDEO_MAX_WAIT_SECS");

        assert_eq!(policy.poll_interval, Duration::from_secs(2));
        assert_eq!(policy.max_attempts, None);
        assert_eq!(policy.max_elapsed, Some(Duration::from_secs(30)));
    }
}

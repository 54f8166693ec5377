use crate::core::util::calculate_workers::calculate_default_workers;
use std::num::NonZeroU32;
use std::time::Duration;

pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_millis(500);
pub const DEFAULT_FRAME_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_RESYNC_SLACK_TICKS: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Upper bound on tiles; a canvas never gets more bands than rows.
    pub workers: NonZeroU32,
    /// How long a tile may take to acknowledge `start` before it is reissued.
    pub start_timeout: Duration,
    /// How long `request_frame` waits for every tile's buffer.
    pub frame_timeout: Duration,
    /// Pause inserted after each tick of a tile running ahead; zero disables
    /// throttling.
    pub sync_delay: Duration,
    /// Ticks a tile may lead the slowest tile by before it is throttled.
    pub resync_slack_ticks: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            workers: calculate_default_workers(),
            start_timeout: DEFAULT_START_TIMEOUT,
            frame_timeout: DEFAULT_FRAME_TIMEOUT,
            sync_delay: Duration::ZERO,
            resync_slack_ticks: DEFAULT_RESYNC_SLACK_TICKS,
        }
    }
}

impl CoordinatorConfig {
    #[must_use]
    pub fn with_workers(workers: NonZeroU32) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_start_timeout_is_half_a_second() {
        let config = CoordinatorConfig::default();

        assert_eq!(config.start_timeout, Duration::from_millis(500));
        assert_eq!(config.sync_delay, Duration::ZERO);
        assert_eq!(config.workers, calculate_default_workers());
    }

    #[test]
    fn test_with_workers_keeps_other_defaults() {
        let config = CoordinatorConfig::with_workers(NonZeroU32::new(3).unwrap());

        assert_eq!(config.workers.get(), 3);
        assert_eq!(config.frame_timeout, DEFAULT_FRAME_TIMEOUT);
        assert_eq!(config.resync_slack_ticks, DEFAULT_RESYNC_SLACK_TICKS);
    }
}

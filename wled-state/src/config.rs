//! Configuration types for the synchronization engine

use std::time::Duration;

use crate::error::{Result, SyncError};

/// Timing and limits shared by every engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Poll interval used when the device settings do not set one
    /// Default: 5 seconds
    pub base_poll_interval: Duration,

    /// Ceiling for the error backoff delay
    /// Default: 60 seconds
    pub max_backoff: Duration,

    /// Delay before the first poll after initialization
    /// Default: 1 second
    pub initial_poll_delay: Duration,

    /// Delay before the first effect/palette/preset fetch
    /// Default: 2 seconds
    pub metadata_fetch_delay: Duration,

    /// Per-request HTTP timeout
    /// Default: 5 seconds
    pub request_timeout: Duration,

    /// Selector id ceiling assumed until the device reports real counts
    /// Default: 255
    pub default_max_id: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_poll_interval: Duration::from_secs(5),
            max_backoff: Duration::from_secs(60),
            initial_poll_delay: Duration::from_secs(1),
            metadata_fetch_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
            default_max_id: 255,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Short delays and a low backoff ceiling, for devices that should
    /// recover quickly after a reboot
    pub fn responsive() -> Self {
        Self {
            base_poll_interval: Duration::from_secs(2),
            max_backoff: Duration::from_secs(20),
            initial_poll_delay: Duration::from_millis(250),
            metadata_fetch_delay: Duration::from_millis(500),
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_poll_interval.is_zero() {
            return Err(SyncError::Configuration(
                "Base poll interval must be greater than 0".to_string(),
            ));
        }

        if self.max_backoff < self.base_poll_interval {
            return Err(SyncError::Configuration(
                "Invalid backoff: max must not be less than the base poll interval".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(SyncError::Configuration(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.default_max_id < 0 {
            return Err(SyncError::Configuration(
                "Default max id must not be negative".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_poll_interval(mut self, base: Duration, max_backoff: Duration) -> Self {
        self.base_poll_interval = base;
        self.max_backoff = max_backoff;
        self
    }

    pub fn with_startup_delays(mut self, first_poll: Duration, metadata_fetch: Duration) -> Self {
        self.initial_poll_delay = first_poll;
        self.metadata_fetch_delay = metadata_fetch;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_default_max_id(mut self, max_id: i64) -> Self {
        self.default_max_id = max_id;
        self
    }
}

/// Delay before the next poll after `consecutive_errors` failures in a row
///
/// `min(base * 2^(n-1), max)` for `n >= 1`; the base interval when there
/// are no errors.
pub fn compute_backoff(base: Duration, consecutive_errors: u32, max: Duration) -> Duration {
    if consecutive_errors == 0 {
        return base;
    }

    2u32.checked_pow(consecutive_errors - 1)
        .and_then(|factor| base.checked_mul(factor))
        .map_or(max, |delay| delay.min(max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.base_poll_interval, Duration::from_secs(5));
        assert_eq!(config.max_backoff, Duration::from_secs(60));
        assert_eq!(config.initial_poll_delay, Duration::from_secs(1));
        assert_eq!(config.metadata_fetch_delay, Duration::from_secs(2));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.default_max_id, 255);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let zero_base = EngineConfig {
            base_poll_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(zero_base.validate().is_err());

        let inverted = EngineConfig::new()
            .with_poll_interval(Duration::from_secs(30), Duration::from_secs(10));
        assert!(inverted.validate().is_err());

        let no_timeout = EngineConfig::new().with_request_timeout(Duration::ZERO);
        assert!(no_timeout.validate().is_err());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::new()
            .with_poll_interval(Duration::from_secs(3), Duration::from_secs(30))
            .with_startup_delays(Duration::ZERO, Duration::from_millis(100))
            .with_request_timeout(Duration::from_secs(2))
            .with_default_max_id(100);

        assert_eq!(config.base_poll_interval, Duration::from_secs(3));
        assert_eq!(config.initial_poll_delay, Duration::ZERO);
        assert_eq!(config.default_max_id, 100);
        assert!(config.validate().is_ok());
        assert!(EngineConfig::responsive().validate().is_ok());
    }

    #[rstest]
    #[case(0, 5_000)]
    #[case(1, 5_000)]
    #[case(2, 10_000)]
    #[case(3, 20_000)]
    #[case(4, 40_000)]
    #[case(5, 60_000)]
    #[case(6, 60_000)]
    #[case(64, 60_000)]
    fn test_backoff_sequence(#[case] errors: u32, #[case] expected_ms: u64) {
        let delay = compute_backoff(Duration::from_millis(5000), errors, Duration::from_secs(60));
        assert_eq!(delay, Duration::from_millis(expected_ms));
    }

    proptest! {
        #[test]
        fn prop_backoff_is_monotonic_and_capped(base_ms in 1u64..120_000, n in 1u32..200) {
            let base = Duration::from_millis(base_ms);
            let max = Duration::from_secs(60);
            let current = compute_backoff(base, n, max);
            let next = compute_backoff(base, n + 1, max);
            prop_assert!(current <= next);
            prop_assert!(next <= max);
        }
    }
}

//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use super::{env_var_or_default, env_var_or_default_str, ManifestConfig};
use crate::constants::{
    DEFAULT_BACKOFF_MAX_MS, DEFAULT_BACKOFF_START_MS, DEFAULT_DEPENDENT_MISSING_REQUEUE_SECS,
    DEFAULT_ERROR_BACKOFF_MAX_SECS, DEFAULT_ERROR_BACKOFF_MIN_SECS,
    DEFAULT_MAX_CONCURRENT_RECONCILIATIONS, DEFAULT_READINESS_POLL_SECS,
    DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS, DEFAULT_WATCH_RESTART_DELAY_SECS,
};
use std::time::Duration;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// How long to wait before re-checking a dependency tier that is not ready (seconds)
    pub readiness_poll_secs: u64,
    /// How long to wait when a workload that should exist is not visible yet (seconds)
    pub dependent_missing_requeue_secs: u64,
    /// Fibonacci backoff floor for reconciliation errors (seconds)
    pub error_backoff_min_secs: u64,
    /// Fibonacci backoff ceiling for reconciliation errors (seconds)
    pub error_backoff_max_secs: u64,
    /// Exponential backoff starting value for watch stream errors (milliseconds)
    pub backoff_start_ms: u64,
    /// Exponential backoff maximum value for watch stream errors (milliseconds)
    pub backoff_max_ms: u64,
    /// Watch stream restart delay after unknown errors (seconds)
    pub watch_restart_delay_secs: u64,
    /// Watch stream restart delay after stream ends (seconds)
    pub watch_restart_delay_after_end_secs: u64,
    /// Maximum concurrent reconciliations across distinct VisitorsApp resources
    pub max_concurrent_reconciliations: u16,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
    /// Naming, images and ports of the managed objects
    pub manifests: ManifestConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            readiness_poll_secs: DEFAULT_READINESS_POLL_SECS,
            dependent_missing_requeue_secs: DEFAULT_DEPENDENT_MISSING_REQUEUE_SECS,
            error_backoff_min_secs: DEFAULT_ERROR_BACKOFF_MIN_SECS,
            error_backoff_max_secs: DEFAULT_ERROR_BACKOFF_MAX_SECS,
            backoff_start_ms: DEFAULT_BACKOFF_START_MS,
            backoff_max_ms: DEFAULT_BACKOFF_MAX_MS,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            watch_restart_delay_after_end_secs: DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            log_level: "INFO".to_string(),
            log_format: "text".to_string(),
            manifests: ManifestConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            readiness_poll_secs: env_var_or_default(
                "READINESS_POLL_SECS",
                DEFAULT_READINESS_POLL_SECS,
            ),
            dependent_missing_requeue_secs: env_var_or_default(
                "DEPENDENT_MISSING_REQUEUE_SECS",
                DEFAULT_DEPENDENT_MISSING_REQUEUE_SECS,
            ),
            error_backoff_min_secs: env_var_or_default(
                "ERROR_BACKOFF_MIN_SECS",
                DEFAULT_ERROR_BACKOFF_MIN_SECS,
            ),
            error_backoff_max_secs: env_var_or_default(
                "ERROR_BACKOFF_MAX_SECS",
                DEFAULT_ERROR_BACKOFF_MAX_SECS,
            ),
            backoff_start_ms: env_var_or_default("BACKOFF_START_MS", DEFAULT_BACKOFF_START_MS),
            backoff_max_ms: env_var_or_default("BACKOFF_MAX_MS", DEFAULT_BACKOFF_MAX_MS),
            watch_restart_delay_secs: env_var_or_default(
                "WATCH_RESTART_DELAY_SECS",
                DEFAULT_WATCH_RESTART_DELAY_SECS,
            ),
            watch_restart_delay_after_end_secs: env_var_or_default(
                "WATCH_RESTART_DELAY_AFTER_END_SECS",
                DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS,
            ),
            max_concurrent_reconciliations: env_var_or_default(
                "MAX_CONCURRENT_RECONCILIATIONS",
                DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            ),
            log_level: env_var_or_default_str("LOG_LEVEL", "INFO"),
            log_format: env_var_or_default_str("LOG_FORMAT", "text"),
            manifests: ManifestConfig::from_env(),
        }
    }

    /// Get readiness poll duration
    #[must_use]
    pub fn readiness_poll_duration(&self) -> Duration {
        Duration::from_secs(self.readiness_poll_secs)
    }

    /// Get the requeue delay used when an expected workload is missing
    #[must_use]
    pub fn dependent_missing_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.dependent_missing_requeue_secs)
    }

    /// Get watch restart delay duration
    #[must_use]
    pub fn watch_restart_delay_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }

    /// Get watch restart delay after end duration
    #[must_use]
    pub fn watch_restart_delay_after_end_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_after_end_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_polls_every_five_seconds() {
        let config = ControllerConfig::default();
        assert_eq!(config.readiness_poll_duration(), Duration::from_secs(5));
        assert_eq!(
            config.dependent_missing_requeue_duration(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_default_backoff_bounds_are_ordered() {
        let config = ControllerConfig::default();
        assert!(config.error_backoff_min_secs <= config.error_backoff_max_secs);
        assert!(config.backoff_start_ms <= config.backoff_max_ms);
        assert!(config.max_concurrent_reconciliations > 0);
    }
}

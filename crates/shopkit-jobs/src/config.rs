//! # Jobs Configuration
//!
//! Configuration for the scheduled sweeps.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     SHOPKIT_OUTBOX_BATCH_SIZE=100                                       │
//! │     SHOPKIT_REPORT_TIMEOUT_SECS=300                                     │
//! │                                                                         │
//! │  2. TOML Config File (--config path, no default location)               │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # jobs.toml
//! [outbox]
//! poll_interval_secs = 30
//! batch_size = 50
//! max_attempts = 5
//!
//! [reports]
//! daily = true
//! monthly = true
//! business_timeout_secs = 120
//!
//! [purge]
//! outbox_retention_days = 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{JobError, JobResult};
use shopkit_core::ReportType;

// =============================================================================
// Outbox Settings
// =============================================================================

/// Outbox dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxSettings {
    /// Interval between poll cycles for the long-running worker (seconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Events handled per poll. Bounded so one invocation's latency stays
    /// capped no matter how deep the backlog is.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Failed events are left for the next poll until they hit this many
    /// attempts; beyond it they stay in the table for inspection.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i64,
}

fn default_poll_interval() -> u64 {
    30
}

fn default_batch_size() -> u32 {
    50
}

fn default_max_attempts() -> i64 {
    5
}

impl Default for OutboxSettings {
    fn default() -> Self {
        OutboxSettings {
            poll_interval_secs: default_poll_interval(),
            batch_size: default_batch_size(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl OutboxSettings {
    /// Poll interval as a Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

// =============================================================================
// Report Settings
// =============================================================================

/// Report sweep settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSettings {
    /// Generate daily reports on each sweep.
    #[serde(default = "default_true")]
    pub daily: bool,

    /// Generate monthly reports on each sweep.
    #[serde(default = "default_true")]
    pub monthly: bool,

    /// Wall-clock budget per business (seconds). A business that exceeds it
    /// is counted as failed; the rest of the batch continues.
    #[serde(default = "default_business_timeout")]
    pub business_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_business_timeout() -> u64 {
    120
}

impl Default for ReportSettings {
    fn default() -> Self {
        ReportSettings {
            daily: default_true(),
            monthly: default_true(),
            business_timeout_secs: default_business_timeout(),
        }
    }
}

impl ReportSettings {
    /// The report types a sweep covers under these settings.
    pub fn kinds(&self) -> Vec<ReportType> {
        let mut kinds = Vec::new();
        if self.daily {
            kinds.push(ReportType::Daily);
        }
        if self.monthly {
            kinds.push(ReportType::Monthly);
        }
        kinds
    }

    /// Per-business budget as a Duration.
    pub fn business_timeout(&self) -> Duration {
        Duration::from_secs(self.business_timeout_secs)
    }
}

// =============================================================================
// Purge Settings
// =============================================================================

/// Retention purge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeSettings {
    /// Processed outbox events older than this many days are deleted.
    /// Expired password reset tokens are always purged regardless.
    #[serde(default = "default_retention_days")]
    pub outbox_retention_days: u32,
}

fn default_retention_days() -> u32 {
    30
}

impl Default for PurgeSettings {
    fn default() -> Self {
        PurgeSettings {
            outbox_retention_days: default_retention_days(),
        }
    }
}

// =============================================================================
// Main Jobs Configuration
// =============================================================================

/// Complete configuration for the scheduled sweeps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Outbox dispatch settings.
    #[serde(default)]
    pub outbox: OutboxSettings,

    /// Report sweep settings.
    #[serde(default)]
    pub reports: ReportSettings,

    /// Retention purge settings.
    #[serde(default)]
    pub purge: PurgeSettings,
}

impl JobsConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file, when a path is given and the file exists
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> JobResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path {
            if path.exists() {
                info!(?path, "Loading jobs config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> JobResult<()> {
        if self.outbox.batch_size == 0 {
            return Err(JobError::InvalidConfig(
                "outbox.batch_size must be greater than 0".into(),
            ));
        }
        if self.outbox.poll_interval_secs == 0 {
            return Err(JobError::InvalidConfig(
                "outbox.poll_interval_secs must be greater than 0".into(),
            ));
        }
        if self.outbox.max_attempts <= 0 {
            return Err(JobError::InvalidConfig(
                "outbox.max_attempts must be greater than 0".into(),
            ));
        }
        if self.reports.business_timeout_secs == 0 {
            return Err(JobError::InvalidConfig(
                "reports.business_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.purge.outbox_retention_days == 0 {
            return Err(JobError::InvalidConfig(
                "purge.outbox_retention_days must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(secs) = std::env::var("SHOPKIT_OUTBOX_POLL_SECS") {
            if let Ok(v) = secs.parse() {
                debug!(poll_interval_secs = v, "Overriding outbox poll interval from environment");
                self.outbox.poll_interval_secs = v;
            }
        }

        if let Ok(size) = std::env::var("SHOPKIT_OUTBOX_BATCH_SIZE") {
            if let Ok(v) = size.parse() {
                self.outbox.batch_size = v;
            }
        }

        if let Ok(attempts) = std::env::var("SHOPKIT_OUTBOX_MAX_ATTEMPTS") {
            if let Ok(v) = attempts.parse() {
                self.outbox.max_attempts = v;
            }
        }

        if let Ok(secs) = std::env::var("SHOPKIT_REPORT_TIMEOUT_SECS") {
            if let Ok(v) = secs.parse() {
                debug!(business_timeout_secs = v, "Overriding report timeout from environment");
                self.reports.business_timeout_secs = v;
            }
        }

        if let Ok(days) = std::env::var("SHOPKIT_PURGE_RETENTION_DAYS") {
            if let Ok(v) = days.parse() {
                self.purge.outbox_retention_days = v;
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = JobsConfig::default();
        assert_eq!(config.outbox.batch_size, 50);
        assert_eq!(config.outbox.max_attempts, 5);
        assert_eq!(config.reports.business_timeout_secs, 120);
        assert_eq!(config.purge.outbox_retention_days, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_sweep_covers_daily_and_monthly() {
        let config = JobsConfig::default();
        assert_eq!(
            config.reports.kinds(),
            vec![ReportType::Daily, ReportType::Monthly]
        );

        let mut config = config;
        config.reports.monthly = false;
        assert_eq!(config.reports.kinds(), vec![ReportType::Daily]);
    }

    #[test]
    fn test_config_validation() {
        let mut config = JobsConfig::default();
        assert!(config.validate().is_ok());

        config.outbox.batch_size = 0;
        assert!(config.validate().is_err());

        config.outbox.batch_size = 50;
        config.reports.business_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip_with_partial_file() {
        let partial = r#"
            [outbox]
            batch_size = 10

            [reports]
            monthly = false
        "#;
        let config: JobsConfig = toml::from_str(partial).unwrap();
        assert_eq!(config.outbox.batch_size, 10);
        // Unspecified fields fall back to defaults.
        assert_eq!(config.outbox.poll_interval_secs, 30);
        assert!(config.reports.daily);
        assert!(!config.reports.monthly);
        assert_eq!(config.purge.outbox_retention_days, 30);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = JobsConfig::load(Some(PathBuf::from("/nonexistent/jobs.toml"))).unwrap();
        assert_eq!(config.outbox.batch_size, 50);
    }
}

//! # Job Error Types
//!
//! Error types for scheduled work.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Job Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │    Storage      │  │      Dispatch           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Db             │  │  Dispatch               │ │
//! │  │  Io             │  │  Engine         │  │  Timeout                │ │
//! │  │  TomlParse      │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Per-business report failures never become a JobError: the sweep        │
//! │  counts them in its summary and keeps going.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use shopkit_db::{DbError, EngineError};

/// Errors surfaced by the job handlers.
#[derive(Debug, Error)]
pub enum JobError {
    /// A configuration value is out of bounds or inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading the config file failed.
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML (or has the wrong shape).
    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A storage operation failed.
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    /// An engine call failed (domain rejection or storage fault).
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// An event handler reported a delivery failure.
    #[error("Dispatch failed for event {event_id}: {message}")]
    Dispatch { event_id: String, message: String },

    /// One business's report generation ran past its wall-clock budget.
    #[error("Report generation timed out for business {business_id}")]
    Timeout { business_id: String },
}

impl JobError {
    /// True when a later invocation may succeed without operator action.
    ///
    /// Config errors need a human; storage faults, dispatch failures and
    /// timeouts are worth retrying on the next scheduler tick.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            JobError::InvalidConfig(_) | JobError::Io(_) | JobError::TomlParse(_)
        )
    }
}

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_not_retryable() {
        assert!(!JobError::InvalidConfig("batch_size".into()).is_retryable());
        assert!(JobError::Timeout {
            business_id: "biz-1".into()
        }
        .is_retryable());
        assert!(JobError::Dispatch {
            event_id: "evt-1".into(),
            message: "smtp down".into()
        }
        .is_retryable());
    }
}

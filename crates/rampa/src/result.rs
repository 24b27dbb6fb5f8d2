//! Result and error types for Rampa.

use thiserror::Error;

/// Result type for Rampa operations
pub type RampaResult<T> = Result<T, RampaError>;

/// Errors that can occur in Rampa
///
/// Only failures that prevent a run from starting (or a bug inside a
/// virtual user) surface here. Failed requests and failed checks are
/// tallied in the [`RunSummary`](crate::RunSummary) instead.
#[derive(Debug, Error)]
pub enum RampaError {
    /// Configuration rejected before the run starts
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// Config file could not be read or decoded
    #[error("Failed to load config from {path}: {message}")]
    ConfigLoad {
        /// Path of the config file
        path: String,
        /// Error message
        message: String,
    },

    /// HTTP client construction failed
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// A virtual-user task failed unexpectedly
    #[error("Runtime error: {message}")]
    Runtime {
        /// Error message
        message: String,
    },
}

impl RampaError {
    /// Create an invalid configuration error
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a config load error
    #[must_use]
    pub fn config_load(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a runtime error
    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    /// Whether this error was raised by configuration validation
    #[must_use]
    pub const fn is_invalid_config(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_error() {
        let err = RampaError::invalid_config("stage 0 has zero duration");
        assert!(err.is_invalid_config());
        assert!(err.to_string().contains("Invalid configuration"));
        assert!(err.to_string().contains("zero duration"));
    }

    #[test]
    fn test_config_load_error() {
        let err = RampaError::config_load("plan.yaml", "missing field");
        let msg = err.to_string();
        assert!(msg.contains("plan.yaml"));
        assert!(msg.contains("missing field"));
        assert!(!err.is_invalid_config());
    }

    #[test]
    fn test_runtime_error() {
        let err = RampaError::runtime("virtual user 3 panicked");
        assert!(err.to_string().starts_with("Runtime error"));
    }
}

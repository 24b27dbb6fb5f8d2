//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rampa library error
    #[error("{0}")]
    Rampa(#[from] rampa::RampaError),

    /// `--fail-on-check` and at least one check failed
    #[error("{failed} of {total} login attempts failed a check")]
    ChecksFailed {
        /// Outcomes with a failed check
        failed: u64,
        /// Requests issued
        total: u64,
    },

    /// Echo server error
    #[error("Server error: {message}")]
    Server {
        /// Error message
        message: String,
    },
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a server error
    #[must_use]
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }
}

//! Per-attempt request outcomes.

use crate::check::{evaluate_all, CheckResults};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Status recorded when no HTTP response was received
pub const SENTINEL_STATUS: u16 = 0;

/// Why an attempt produced no usable response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestErrorKind {
    /// Connection refused or host unreachable
    Connection,
    /// Request timed out
    Timeout,
    /// Response body could not be read
    Body,
    /// Other error
    Other,
}

impl std::fmt::Display for RequestErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection => write!(f, "Connection"),
            Self::Timeout => write!(f, "Timeout"),
            Self::Body => write!(f, "Body"),
            Self::Other => write!(f, "Other"),
        }
    }
}

/// Result of one login attempt, consumed immediately by the tally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOutcome {
    /// HTTP status, or [`SENTINEL_STATUS`] on transport failure
    pub status_code: u16,
    /// Response body
    pub body: Vec<u8>,
    /// Wall time from send to full body
    pub elapsed: Duration,
    /// Check name -> passed
    pub checks_passed: CheckResults,
    /// Set when the attempt failed before a response was read
    pub error: Option<RequestErrorKind>,
}

impl RequestOutcome {
    /// Outcome for a completed HTTP exchange
    pub fn completed(status_code: u16, body: Vec<u8>, elapsed: Duration) -> Self {
        let checks_passed = evaluate_all(status_code, &body);
        Self {
            status_code,
            body,
            elapsed,
            checks_passed,
            error: None,
        }
    }

    /// Outcome for a transport failure; every check fails
    pub fn failed(kind: RequestErrorKind, elapsed: Duration) -> Self {
        Self {
            status_code: SENTINEL_STATUS,
            body: Vec::new(),
            elapsed,
            checks_passed: evaluate_all(SENTINEL_STATUS, &[]),
            error: Some(kind),
        }
    }

    /// Whether the named check passed
    pub fn passed(&self, check: &str) -> bool {
        self.checks_passed.get(check).copied().unwrap_or(false)
    }

    /// Whether every check passed
    pub fn all_passed(&self) -> bool {
        self.checks_passed.values().all(|passed| *passed)
    }

    /// Whether the attempt failed at the transport level
    pub fn is_transport_failure(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{RESPONSE_CONTAINS_DATA, SUCCESS_LOGIN};

    #[test]
    fn test_completed_success() {
        let outcome = RequestOutcome::completed(
            200,
            br#"{"username":"Test"}"#.to_vec(),
            Duration::from_millis(3),
        );
        assert!(outcome.all_passed());
        assert!(outcome.passed(SUCCESS_LOGIN));
        assert!(!outcome.is_transport_failure());
    }

    #[test]
    fn test_completed_server_error() {
        let outcome = RequestOutcome::completed(500, Vec::new(), Duration::from_millis(1));
        assert!(!outcome.passed(SUCCESS_LOGIN));
        assert!(!outcome.passed(RESPONSE_CONTAINS_DATA));
        assert!(!outcome.all_passed());
        assert!(!outcome.is_transport_failure());
    }

    #[test]
    fn test_failed_uses_sentinel() {
        let outcome = RequestOutcome::failed(RequestErrorKind::Timeout, Duration::from_secs(60));
        assert_eq!(outcome.status_code, SENTINEL_STATUS);
        assert!(outcome.body.is_empty());
        assert_eq!(outcome.checks_passed.len(), 2);
        assert!(outcome.checks_passed.values().all(|p| !p));
        assert_eq!(outcome.error, Some(RequestErrorKind::Timeout));
    }

    #[test]
    fn test_unknown_check_is_not_passed() {
        let outcome = RequestOutcome::completed(200, b"username".to_vec(), Duration::ZERO);
        assert!(!outcome.passed("latencyBudget"));
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(RequestErrorKind::Connection.to_string(), "Connection");
        assert_eq!(RequestErrorKind::Timeout.to_string(), "Timeout");
        assert_eq!(RequestErrorKind::Body.to_string(), "Body");
        assert_eq!(RequestErrorKind::Other.to_string(), "Other");
    }
}

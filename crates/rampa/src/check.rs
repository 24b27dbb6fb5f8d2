//! Response checks.
//!
//! Every outcome is evaluated against both checks. A failing check is only
//! tallied; it never stops a virtual user or the run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the status check
pub const SUCCESS_LOGIN: &str = "successLogin";
/// Name of the body check
pub const RESPONSE_CONTAINS_DATA: &str = "responseContainsData";

const BODY_MARKER: &[u8] = b"username";

/// Check name -> passed
pub type CheckResults = BTreeMap<&'static str, bool>;

/// The named predicates applied to every login response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LoginCheck {
    /// Status code is exactly 200
    SuccessLogin,
    /// Body is non-empty and contains `username`
    ResponseContainsData,
}

impl LoginCheck {
    /// All checks, in report order
    pub const ALL: [Self; 2] = [Self::SuccessLogin, Self::ResponseContainsData];

    /// Stable name used in reports
    pub const fn name(self) -> &'static str {
        match self {
            Self::SuccessLogin => SUCCESS_LOGIN,
            Self::ResponseContainsData => RESPONSE_CONTAINS_DATA,
        }
    }

    /// Human-readable predicate
    pub const fn description(self) -> &'static str {
        match self {
            Self::SuccessLogin => "status == 200",
            Self::ResponseContainsData => "body contains 'username'",
        }
    }

    /// Position in [`LoginCheck::ALL`]
    pub const fn index(self) -> usize {
        match self {
            Self::SuccessLogin => 0,
            Self::ResponseContainsData => 1,
        }
    }

    /// Evaluate against a response
    pub fn evaluate(self, status_code: u16, body: &[u8]) -> bool {
        match self {
            Self::SuccessLogin => status_code == 200,
            Self::ResponseContainsData => contains(body, BODY_MARKER),
        }
    }
}

impl std::fmt::Display for LoginCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Evaluate every check
pub fn evaluate_all(status_code: u16, body: &[u8]) -> CheckResults {
    LoginCheck::ALL
        .iter()
        .map(|check| (check.name(), check.evaluate(status_code, body)))
        .collect()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !haystack.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_with_username_passes_both() {
        let results = evaluate_all(200, br#"{"username":"x"}"#);
        assert!(results[SUCCESS_LOGIN]);
        assert!(results[RESPONSE_CONTAINS_DATA]);
    }

    #[test]
    fn test_non_200_fails_success_login() {
        for status in [0, 201, 302, 400, 401, 500, 503] {
            assert!(!LoginCheck::SuccessLogin.evaluate(status, b"username"));
        }
    }

    #[test]
    fn test_empty_body_fails_contains() {
        assert!(!LoginCheck::ResponseContainsData.evaluate(200, b""));
        let results = evaluate_all(200, b"");
        assert!(results[SUCCESS_LOGIN]);
        assert!(!results[RESPONSE_CONTAINS_DATA]);
    }

    #[test]
    fn test_body_without_marker() {
        assert!(!LoginCheck::ResponseContainsData.evaluate(200, br#"{"user":"x"}"#));
        assert!(!LoginCheck::ResponseContainsData.evaluate(200, b"USERNAME"));
        assert!(LoginCheck::ResponseContainsData.evaluate(500, b"bad username"));
    }

    #[test]
    fn test_checks_are_independent() {
        let results = evaluate_all(500, br#"{"username":"x"}"#);
        assert!(!results[SUCCESS_LOGIN]);
        assert!(results[RESPONSE_CONTAINS_DATA]);
    }

    #[test]
    fn test_names_and_indices() {
        assert_eq!(LoginCheck::SuccessLogin.to_string(), "successLogin");
        assert_eq!(LoginCheck::ResponseContainsData.name(), "responseContainsData");
        for (i, check) in LoginCheck::ALL.iter().enumerate() {
            assert_eq!(check.index(), i);
        }
        assert_eq!(LoginCheck::SuccessLogin.description(), "status == 200");
    }
}

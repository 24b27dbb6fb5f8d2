//! Human-readable durations for config files and reports.
//!
//! Accepted forms: `800ns`, `250us`, `500ms`, `30s`, `2m`, `1h`, or a bare integer
//! meaning seconds.

use crate::result::{RampaError, RampaResult};
use std::time::Duration;

/// Parse a duration string like "500ms", "30s", "2m", "1h".
pub fn parse_duration(s: &str) -> RampaResult<Duration> {
    let s = s.trim();
    let invalid = || {
        RampaError::invalid_config(format!(
            "Invalid duration: {s:?}. Use 500ms, 30s, 2m, or 1h"
        ))
    };

    let (digits, unit) = ["ns", "us", "ms", "s", "m", "h"]
        .iter()
        .find_map(|&unit| s.strip_suffix(unit).map(|digits| (digits, unit)))
        .unwrap_or((s, "s"));

    let n: u64 = digits.trim().parse().map_err(|_| invalid())?;
    let duration = match unit {
        "ns" => Some(Duration::from_nanos(n)),
        "us" => Some(Duration::from_micros(n)),
        "ms" => Some(Duration::from_millis(n)),
        "m" => n.checked_mul(60).map(Duration::from_secs),
        "h" => n.checked_mul(3600).map(Duration::from_secs),
        _ => Some(Duration::from_secs(n)),
    };
    duration.ok_or_else(invalid)
}

/// Format a duration in the largest unit that represents it exactly.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if d.subsec_nanos() == 0 {
        if secs > 0 && secs % 3600 == 0 {
            return format!("{}h", secs / 3600);
        }
        if secs > 0 && secs % 60 == 0 {
            return format!("{}m", secs / 60);
        }
        return format!("{secs}s");
    }
    if d.subsec_nanos() % 1000 != 0 {
        return format!("{}ns", d.as_nanos());
    }
    let micros = d.as_micros();
    if micros % 1000 == 0 {
        format!("{}ms", micros / 1000)
    } else {
        format!("{micros}us")
    }
}

/// `#[serde(with = "...")]` adapter storing a `Duration` as a string.
pub mod serde_duration {
    use super::{format_duration, parse_duration};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Secs(u64),
    }

    impl Raw {
        fn into_duration<E: serde::de::Error>(self) -> Result<Duration, E> {
            match self {
                Self::Text(s) => parse_duration(&s).map_err(E::custom),
                Self::Secs(n) => Ok(Duration::from_secs(n)),
            }
        }
    }

    /// Serialize as `30s`, `500ms`, ...
    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*d))
    }

    /// Accept a duration string or bare seconds
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Raw::deserialize(deserializer)?.into_duration()
    }

    /// Same encoding for `Option<Duration>`.
    pub mod option {
        use super::Raw;
        use serde::{Deserialize, Deserializer, Serializer};
        use std::time::Duration;

        /// Serialize `Some` as a duration string, `None` as null
        pub fn serialize<S: Serializer>(
            d: &Option<Duration>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match d {
                Some(d) => super::serialize(d, serializer),
                None => serializer.serialize_none(),
            }
        }

        /// Accept null, a duration string or bare seconds
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Duration>, D::Error> {
            Option::<Raw>::deserialize(deserializer)?
                .map(Raw::into_duration)
                .transpose()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_duration("800ns").unwrap(), Duration::from_nanos(800));
        assert_eq!(parse_duration("250us").unwrap(), Duration::from_micros(250));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_parse_bare_seconds() {
        assert_eq!(parse_duration("60").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration(" 5s ").unwrap(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_invalid() {
        for bad in ["", "abc", "1.5s", "-3s", "10d"] {
            let err = parse_duration(bad).unwrap_err();
            assert!(err.is_invalid_config(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_parse_overflow() {
        assert!(parse_duration(&format!("{}h", u64::MAX)).is_err());
    }

    #[test]
    fn test_format() {
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h");
        assert_eq!(format_duration(Duration::from_secs(60)), "1m");
        assert_eq!(format_duration(Duration::from_secs(90)), "90s");
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1500ms");
        assert_eq!(format_duration(Duration::from_micros(1234)), "1234us");
        assert_eq!(format_duration(Duration::from_nanos(500)), "500ns");
        assert_eq!(format_duration(Duration::new(1, 1)), "1000000001ns");
    }

    #[test]
    fn test_sub_microsecond_values_survive_formatting() {
        for d in [
            Duration::from_nanos(1),
            Duration::from_nanos(1_500),
            Duration::new(3, 999_999_999),
        ] {
            assert_eq!(parse_duration(&format_duration(d)).unwrap(), d);
        }
    }

    #[test]
    fn test_serde_accepts_numbers_and_strings() {
        #[derive(serde::Deserialize, serde::Serialize)]
        struct Wrapper {
            #[serde(with = "serde_duration")]
            d: Duration,
            #[serde(with = "serde_duration::option", default)]
            o: Option<Duration>,
        }

        let w: Wrapper = serde_json::from_str(r#"{"d": 45, "o": "100ms"}"#).unwrap();
        assert_eq!(w.d, Duration::from_secs(45));
        assert_eq!(w.o, Some(Duration::from_millis(100)));

        let w: Wrapper = serde_json::from_str(r#"{"d": "1m"}"#).unwrap();
        assert_eq!(w.o, None);
        assert_eq!(serde_json::to_string(&w).unwrap(), r#"{"d":"1m","o":null}"#);

        assert!(serde_json::from_str::<Wrapper>(r#"{"d": "soon"}"#).is_err());
    }
}

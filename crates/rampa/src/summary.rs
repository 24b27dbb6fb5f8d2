//! Outcome tallies and run summaries.
//!
//! [`OutcomeTally`] is the only state virtual users share: plain atomic
//! counters, updated once per completed attempt. [`RunSummary`] is the
//! snapshot handed to reporters when the run ends.

use crate::check::LoginCheck;
use crate::duration::serde_duration;
use crate::outcome::RequestOutcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

// =============================================================================
// Tally
// =============================================================================

#[derive(Debug, Default)]
struct CheckCounter {
    passed: AtomicU64,
    failed: AtomicU64,
}

/// Lock-free counters fed by every virtual user
#[derive(Debug)]
pub struct OutcomeTally {
    total: AtomicU64,
    failed_outcomes: AtomicU64,
    transport_errors: AtomicU64,
    checks: [CheckCounter; LoginCheck::ALL.len()],
    latency_min_ns: AtomicU64,
    latency_max_ns: AtomicU64,
    latency_sum_ns: AtomicU64,
}

impl Default for OutcomeTally {
    fn default() -> Self {
        Self {
            total: AtomicU64::new(0),
            failed_outcomes: AtomicU64::new(0),
            transport_errors: AtomicU64::new(0),
            checks: Default::default(),
            latency_min_ns: AtomicU64::new(u64::MAX),
            latency_max_ns: AtomicU64::new(0),
            latency_sum_ns: AtomicU64::new(0),
        }
    }
}

impl OutcomeTally {
    /// Create an empty tally
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one outcome
    pub fn record(&self, outcome: &RequestOutcome) {
        for check in LoginCheck::ALL {
            let counter = &self.checks[check.index()];
            if outcome.passed(check.name()) {
                counter.passed.fetch_add(1, Ordering::Relaxed);
            } else {
                counter.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
        if !outcome.all_passed() {
            self.failed_outcomes.fetch_add(1, Ordering::Relaxed);
        }
        if outcome.is_transport_failure() {
            self.transport_errors.fetch_add(1, Ordering::Relaxed);
        }

        let nanos = u64::try_from(outcome.elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.latency_min_ns.fetch_min(nanos, Ordering::Relaxed);
        self.latency_max_ns.fetch_max(nanos, Ordering::Relaxed);
        self.latency_sum_ns.fetch_add(nanos, Ordering::Relaxed);
        // Counted last so a concurrent reader never sees more requests than
        // latency samples.
        self.total.fetch_add(1, Ordering::Release);
    }

    /// Requests recorded so far
    pub fn total_requests(&self) -> u64 {
        self.total.load(Ordering::Acquire)
    }

    /// Outcomes with at least one failed check so far
    pub fn failed_outcomes(&self) -> u64 {
        self.failed_outcomes.load(Ordering::Relaxed)
    }

    /// Per-check counts so far
    pub fn check_results(&self) -> BTreeMap<String, CheckCounts> {
        LoginCheck::ALL
            .iter()
            .map(|check| {
                let counter = &self.checks[check.index()];
                (
                    check.name().to_string(),
                    CheckCounts {
                        passed: counter.passed.load(Ordering::Relaxed),
                        failed: counter.failed.load(Ordering::Relaxed),
                    },
                )
            })
            .collect()
    }

    /// Latency aggregates so far
    pub fn latency(&self) -> LatencySummary {
        let count = self.total_requests();
        if count == 0 {
            return LatencySummary::default();
        }
        let sum = self.latency_sum_ns.load(Ordering::Relaxed);
        LatencySummary {
            min: Duration::from_nanos(self.latency_min_ns.load(Ordering::Relaxed)),
            max: Duration::from_nanos(self.latency_max_ns.load(Ordering::Relaxed)),
            mean: Duration::from_nanos(sum / count),
        }
    }

    /// Freeze the tally into a summary
    pub fn summarize(
        &self,
        stages: Vec<StageReport>,
        elapsed: Duration,
        started_at: String,
    ) -> RunSummary {
        RunSummary {
            started_at,
            elapsed,
            total_requests: self.total_requests(),
            failed_outcomes: self.failed_outcomes(),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            check_results: self.check_results(),
            latency: self.latency(),
            stages,
        }
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Pass/fail counts for one check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckCounts {
    /// Outcomes where the check passed
    pub passed: u64,
    /// Outcomes where the check failed
    pub failed: u64,
}

impl CheckCounts {
    /// Total evaluations
    pub const fn total(&self) -> u64 {
        self.passed + self.failed
    }

    /// Pass rate as a percentage
    pub fn pass_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total() as f64) * 100.0
        }
    }
}

/// Min/max/mean request latency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencySummary {
    /// Fastest request
    #[serde(with = "serde_duration")]
    pub min: Duration,
    /// Slowest request
    #[serde(with = "serde_duration")]
    pub max: Duration,
    /// Mean request latency
    #[serde(with = "serde_duration")]
    pub mean: Duration,
}

/// What the ramp looked like when a stage ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    /// Stage position in the plan
    pub index: usize,
    /// Stage target
    pub target: usize,
    /// Active virtual users once the stage closed
    pub active_at_end: usize,
    /// Wall time spent in the stage
    #[serde(with = "serde_duration")]
    pub elapsed: Duration,
}

/// Final report of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// RFC 3339 start time
    pub started_at: String,
    /// Wall time of the whole run, drain included
    #[serde(with = "serde_duration")]
    pub elapsed: Duration,
    /// Requests issued
    pub total_requests: u64,
    /// Outcomes with at least one failed check
    pub failed_outcomes: u64,
    /// Outcomes that never got an HTTP response
    pub transport_errors: u64,
    /// Check name -> pass/fail counts
    pub check_results: BTreeMap<String, CheckCounts>,
    /// Latency aggregates
    pub latency: LatencySummary,
    /// One entry per completed stage
    pub stages: Vec<StageReport>,
}

impl RunSummary {
    /// Counts for the named check
    pub fn check(&self, name: &str) -> CheckCounts {
        self.check_results.get(name).copied().unwrap_or_default()
    }

    /// Whether no check failed
    pub fn all_checks_passed(&self) -> bool {
        self.check_results.values().all(|c| c.failed == 0)
    }

    /// Failed outcomes as a percentage of requests
    pub fn failure_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            (self.failed_outcomes as f64 / self.total_requests as f64) * 100.0
        }
    }

    /// Average requests per second over the run
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_requests as f64 / secs
        } else {
            0.0
        }
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Render a summary as text
pub fn render_summary_report(summary: &RunSummary) -> String {
    let mut output = String::new();

    output.push_str("LOGIN LOAD TEST RESULTS\n");
    output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    output.push_str(&format!(
        "Started: {} │ Elapsed: {:.1}s │ Requests: {} │ Failed: {} ({:.2}%)\n",
        summary.started_at,
        summary.elapsed.as_secs_f64(),
        summary.total_requests,
        summary.failed_outcomes,
        summary.failure_rate()
    ));
    output.push_str(&format!(
        "Throughput: {:.1} req/s │ Transport errors: {}\n\n",
        summary.throughput(),
        summary.transport_errors
    ));

    output.push_str("Checks:\n");
    output.push_str("┌──────────────────────┬──────────────────────────┬──────────┬──────────┬─────────┐\n");
    output.push_str("│ Check                │ Predicate                │ Passed   │ Failed   │ Rate    │\n");
    output.push_str("├──────────────────────┼──────────────────────────┼──────────┼──────────┼─────────┤\n");
    for check in LoginCheck::ALL {
        let counts = summary.check(check.name());
        output.push_str(&format!(
            "│ {:<20} │ {:<24} │ {:>8} │ {:>8} │ {:>6.2}% │\n",
            check.name(),
            check.description(),
            counts.passed,
            counts.failed,
            counts.pass_rate()
        ));
    }
    output.push_str("└──────────────────────┴──────────────────────────┴──────────┴──────────┴─────────┘\n\n");

    output.push_str("Latency:\n");
    output.push_str(&format!(
        "  min {:.2}ms │ mean {:.2}ms │ max {:.2}ms\n\n",
        millis(summary.latency.min),
        millis(summary.latency.mean),
        millis(summary.latency.max)
    ));

    output.push_str("Stages:\n");
    for stage in &summary.stages {
        let symbol = if stage.active_at_end == stage.target {
            "✓"
        } else {
            "✗"
        };
        output.push_str(&format!(
            "  {} #{} target {} reached {} in {:.1}s\n",
            symbol,
            stage.index,
            stage.target,
            stage.active_at_end,
            stage.elapsed.as_secs_f64()
        ));
    }

    output
}

/// Render a summary as JSON
pub fn render_summary_json(summary: &RunSummary) -> String {
    serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string())
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::check::{RESPONSE_CONTAINS_DATA, SUCCESS_LOGIN};
    use crate::outcome::RequestErrorKind;
    use std::sync::Arc;

    fn ok(ms: u64) -> RequestOutcome {
        RequestOutcome::completed(200, br#"{"username":"x"}"#.to_vec(), Duration::from_millis(ms))
    }

    #[test]
    fn test_empty_tally() {
        let tally = OutcomeTally::new();
        let summary = tally.summarize(Vec::new(), Duration::ZERO, String::new());
        assert_eq!(summary.total_requests, 0);
        assert_eq!(summary.latency, LatencySummary::default());
        assert_eq!(summary.check(SUCCESS_LOGIN), CheckCounts::default());
        assert!(summary.all_checks_passed());
        assert_eq!(summary.failure_rate(), 0.0);
        assert_eq!(summary.throughput(), 0.0);
    }

    #[test]
    fn test_tally_counts_and_latency() {
        let tally = OutcomeTally::new();
        tally.record(&ok(10));
        tally.record(&ok(30));
        tally.record(&RequestOutcome::completed(500, Vec::new(), Duration::from_millis(20)));

        let summary = tally.summarize(Vec::new(), Duration::from_secs(1), "t0".into());
        assert_eq!(summary.total_requests, 3);
        assert_eq!(summary.failed_outcomes, 1);
        assert_eq!(summary.transport_errors, 0);
        assert_eq!(summary.check(SUCCESS_LOGIN), CheckCounts { passed: 2, failed: 1 });
        assert_eq!(
            summary.check(RESPONSE_CONTAINS_DATA),
            CheckCounts { passed: 2, failed: 1 }
        );
        assert_eq!(summary.latency.min, Duration::from_millis(10));
        assert_eq!(summary.latency.max, Duration::from_millis(30));
        assert_eq!(summary.latency.mean, Duration::from_millis(20));
        assert!(!summary.all_checks_passed());
        assert!((summary.failure_rate() - 33.333).abs() < 0.01);
        assert_eq!(summary.throughput(), 3.0);
    }

    #[test]
    fn test_transport_failures_counted() {
        let tally = OutcomeTally::new();
        tally.record(&RequestOutcome::failed(
            RequestErrorKind::Connection,
            Duration::from_millis(1),
        ));
        let summary = tally.summarize(Vec::new(), Duration::from_secs(1), String::new());
        assert_eq!(summary.transport_errors, 1);
        assert_eq!(summary.failed_outcomes, 1);
        assert_eq!(summary.check(SUCCESS_LOGIN).failed, 1);
        assert_eq!(summary.check(RESPONSE_CONTAINS_DATA).failed, 1);
    }

    #[test]
    fn test_concurrent_records() {
        let tally = Arc::new(OutcomeTally::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let tally = Arc::clone(&tally);
                std::thread::spawn(move || {
                    for j in 0..1000 {
                        tally.record(&ok(1 + (i * 1000 + j) % 50));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(tally.total_requests(), 8000);
        let checks = tally.check_results();
        assert_eq!(checks[SUCCESS_LOGIN].passed, 8000);
        assert_eq!(tally.latency().min, Duration::from_millis(1));
        assert_eq!(tally.latency().max, Duration::from_millis(50));
    }

    #[test]
    fn test_check_counts_pass_rate() {
        let counts = CheckCounts { passed: 3, failed: 1 };
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.pass_rate(), 75.0);
        assert_eq!(CheckCounts::default().pass_rate(), 0.0);
    }

    #[test]
    fn test_render_report() {
        let tally = OutcomeTally::new();
        tally.record(&ok(5));
        let stages = vec![StageReport {
            index: 0,
            target: 2,
            active_at_end: 2,
            elapsed: Duration::from_secs(1),
        }];
        let summary = tally.summarize(stages, Duration::from_secs(1), "2026-10-16T00:00:00Z".into());
        let report = render_summary_report(&summary);
        assert!(report.contains("LOGIN LOAD TEST RESULTS"));
        assert!(report.contains("successLogin"));
        assert!(report.contains("responseContainsData"));
        assert!(report.contains("status == 200"));
        assert!(report.contains("body contains 'username'"));
        assert!(report.contains("✓ #0 target 2 reached 2"));
    }

    #[test]
    fn test_render_json_roundtrip_fields() {
        let tally = OutcomeTally::new();
        tally.record(&ok(5));
        let summary = tally.summarize(Vec::new(), Duration::from_secs(2), "t".into());
        let json = render_summary_json(&summary);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_requests"], 1);
        assert_eq!(value["check_results"]["successLogin"]["passed"], 1);
        assert_eq!(value["latency"]["min"], "5ms");
        assert_eq!(value["elapsed"], "2s");

        let back: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }

    #[test]
    fn test_render_json_keeps_nanosecond_latency() {
        let tally = OutcomeTally::new();
        tally.record(&RequestOutcome::completed(
            200,
            br#"{"username":"x"}"#.to_vec(),
            Duration::from_nanos(500),
        ));
        let summary = tally.summarize(Vec::new(), Duration::from_secs(1), "t".into());
        assert_eq!(summary.latency.mean, Duration::from_nanos(500));

        let json = render_summary_json(&summary);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["latency"]["mean"], "500ns");
        let back: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.latency, summary.latency);
    }
}

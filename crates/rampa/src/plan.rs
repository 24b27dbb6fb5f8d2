//! Run plans: the ordered stage schedule a ramp follows.
//!
//! Each [`Stage`] is a linear ramp from whatever number of virtual users was
//! active when it began to its `target`, spread over its `duration`. A stage
//! whose target equals the previous one is a hold.

use crate::duration::{format_duration, parse_duration, serde_duration};
use crate::result::{RampaError, RampaResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One segment of the concurrency ramp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// How long the ramp toward `target` takes
    #[serde(with = "serde_duration")]
    pub duration: Duration,
    /// Active virtual users at the end of the stage
    pub target: usize,
}

impl Stage {
    /// Create a stage
    pub const fn new(duration: Duration, target: usize) -> Self {
        Self { duration, target }
    }

    /// Create a stage from whole seconds
    pub const fn secs(secs: u64, target: usize) -> Self {
        Self::new(Duration::from_secs(secs), target)
    }

    /// Users that should be active `elapsed` into this stage, ramping from
    /// `start`
    pub fn users_at(&self, start: usize, elapsed: Duration) -> usize {
        if self.duration.is_zero() {
            return self.target;
        }
        let fraction = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        desired_active(start, self.target, fraction)
    }

    /// Whether this stage changes the active count when entered with `start`
    pub const fn is_ramp_from(&self, start: usize) -> bool {
        self.target != start
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", format_duration(self.duration), self.target)
    }
}

impl std::str::FromStr for Stage {
    type Err = RampaError;

    /// Parse `DURATION:TARGET`, e.g. `30s:100`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (duration, target) = s.split_once(':').ok_or_else(|| {
            RampaError::invalid_config(format!("Invalid stage {s:?}. Use DURATION:TARGET, e.g. 30s:100"))
        })?;
        let duration = parse_duration(duration)?;
        let target = target.trim().parse::<usize>().map_err(|_| {
            RampaError::invalid_config(format!("Invalid stage target {target:?} in {s:?}"))
        })?;
        Ok(Self::new(duration, target))
    }
}

/// Linear ramp: `round(start + fraction * (target - start))`
///
/// `fraction` is clamped to `[0, 1]`; the result always lies between
/// `start` and `target` inclusive.
pub fn desired_active(start: usize, target: usize, fraction: f64) -> usize {
    let fraction = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    let delta = target as f64 - start as f64;
    let desired = (start as f64 + fraction * delta).round() as usize;
    desired.clamp(start.min(target), start.max(target))
}

/// Ordered, validated stage schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunPlan {
    stages: Vec<Stage>,
}

impl RunPlan {
    /// Create a plan, rejecting empty schedules and zero-length stages
    pub fn new(stages: Vec<Stage>) -> RampaResult<Self> {
        let plan = Self { stages };
        plan.validate()?;
        Ok(plan)
    }

    /// The stock login profile: up to 3000 users over
    /// three one-minute ramps, then one minute back down to zero
    pub fn login_default() -> Self {
        Self {
            stages: default_stages(),
        }
    }

    /// Check plan invariants
    pub fn validate(&self) -> RampaResult<()> {
        if self.stages.is_empty() {
            return Err(RampaError::invalid_config("run plan has no stages"));
        }
        if let Some(index) = self.stages.iter().position(|s| s.duration.is_zero()) {
            return Err(RampaError::invalid_config(format!(
                "stage {index} has a zero duration"
            )));
        }
        Ok(())
    }

    /// Stages in execution order
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Iterate stages in execution order
    pub fn iter(&self) -> std::slice::Iter<'_, Stage> {
        self.stages.iter()
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the plan has no stages
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Sum of all stage durations
    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    /// Highest target across all stages
    pub fn peak_target(&self) -> usize {
        self.stages.iter().map(|s| s.target).max().unwrap_or(0)
    }

    /// Target of the final stage
    pub fn final_target(&self) -> usize {
        self.stages.last().map_or(0, |s| s.target)
    }
}

impl<'a> IntoIterator for &'a RunPlan {
    type Item = &'a Stage;
    type IntoIter = std::slice::Iter<'a, Stage>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub(crate) fn default_stages() -> Vec<Stage> {
    vec![
        Stage::secs(60, 1000),
        Stage::secs(60, 2000),
        Stage::secs(60, 3000),
        Stage::secs(60, 0),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_stage_ramp_up() {
        let stage = Stage::secs(60, 100);
        assert_eq!(stage.users_at(10, Duration::ZERO), 10);
        assert_eq!(stage.users_at(10, Duration::from_secs(30)), 55);
        assert_eq!(stage.users_at(10, Duration::from_secs(60)), 100);
        assert_eq!(stage.users_at(10, Duration::from_secs(90)), 100);
    }

    #[test]
    fn test_stage_ramp_down() {
        let stage = Stage::secs(10, 0);
        assert_eq!(stage.users_at(20, Duration::ZERO), 20);
        assert_eq!(stage.users_at(20, Duration::from_secs(5)), 10);
        assert_eq!(stage.users_at(20, Duration::from_secs(10)), 0);
    }

    #[test]
    fn test_stage_hold() {
        let stage = Stage::secs(30, 50);
        assert!(!stage.is_ramp_from(50));
        assert!(stage.is_ramp_from(0));
        assert_eq!(stage.users_at(50, Duration::from_secs(17)), 50);
    }

    #[test]
    fn test_desired_active_rounds() {
        // 0 -> 3 at f = 0.5 is 1.5, rounds away from zero
        assert_eq!(desired_active(0, 3, 0.5), 2);
        assert_eq!(desired_active(0, 3, 0.1), 0);
        assert_eq!(desired_active(3, 0, 0.5), 2);
    }

    #[test]
    fn test_desired_active_nan_fraction() {
        assert_eq!(desired_active(4, 8, f64::NAN), 4);
    }

    #[test]
    fn test_stage_parse_and_display() {
        let stage: Stage = "30s:100".parse().unwrap();
        assert_eq!(stage, Stage::secs(30, 100));
        assert_eq!(stage.to_string(), "30s:100");

        let stage: Stage = "1m:0".parse().unwrap();
        assert_eq!(stage, Stage::secs(60, 0));
    }

    #[test]
    fn test_stage_parse_invalid() {
        assert!("30s".parse::<Stage>().is_err());
        assert!("30s:-1".parse::<Stage>().is_err());
        assert!("soon:10".parse::<Stage>().is_err());
    }

    #[test]
    fn test_plan_rejects_empty() {
        let err = RunPlan::new(vec![]).unwrap_err();
        assert!(err.to_string().contains("no stages"));
    }

    #[test]
    fn test_plan_rejects_zero_duration() {
        let err = RunPlan::new(vec![Stage::secs(5, 1), Stage::secs(0, 2)]).unwrap_err();
        assert!(err.to_string().contains("stage 1"));
    }

    #[test]
    fn test_login_default_profile() {
        let plan = RunPlan::login_default();
        assert_eq!(plan.len(), 4);
        assert_eq!(plan.total_duration(), Duration::from_secs(240));
        assert_eq!(plan.peak_target(), 3000);
        assert_eq!(plan.final_target(), 0);
        plan.validate().unwrap();
    }

    #[test]
    fn test_plan_yaml() {
        let yaml = "- duration: 30s\n  target: 10\n- duration: 1m\n  target: 0\n";
        let plan: RunPlan = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(plan.stages(), &[Stage::secs(30, 10), Stage::secs(60, 0)]);
    }

    proptest! {
        #[test]
        fn prop_desired_within_bounds(start in 0usize..5000, target in 0usize..5000, f in 0.0f64..=1.0) {
            let desired = desired_active(start, target, f);
            prop_assert!(desired >= start.min(target));
            prop_assert!(desired <= start.max(target));
        }

        #[test]
        fn prop_stage_reaches_target_at_end(start in 0usize..5000, target in 0usize..5000, secs in 1u64..600) {
            let stage = Stage::secs(secs, target);
            prop_assert_eq!(stage.users_at(start, stage.duration), target);
            prop_assert_eq!(stage.users_at(start, Duration::ZERO), start);
        }

        #[test]
        fn prop_ramp_is_monotonic(start in 0usize..500, target in 0usize..500, a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let first = desired_active(start, target, lo);
            let second = desired_active(start, target, hi);
            if target >= start {
                prop_assert!(first <= second);
            } else {
                prop_assert!(first >= second);
            }
        }
    }
}

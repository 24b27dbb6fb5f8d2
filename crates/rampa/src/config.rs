//! Run configuration.
//!
//! A [`RunConfig`] is loaded from YAML or JSON (or built in code with the
//! `with_*` setters) and validated once before a run starts. Missing fields
//! take the defaults of the stock login profile.

use crate::controller::DrainPolicy;
use crate::duration::serde_duration;
use crate::plan::{default_stages, RunPlan, Stage};
use crate::request::{
    parse_target_url, CredentialMode, DEFAULT_PASSWORD, DEFAULT_PASSWORD_LENGTH, DEFAULT_TIMEOUT,
    DEFAULT_URL, DEFAULT_USERNAME, DEFAULT_USERNAME_LENGTH,
};
use crate::result::{RampaError, RampaResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default controller tick
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Everything a run needs besides the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Login endpoint
    pub url: String,
    /// Credential mode
    pub mode: CredentialMode,
    /// Username used in fixed mode
    pub fixed_username: String,
    /// Password used in fixed mode
    pub fixed_password: String,
    /// Username length in random mode
    pub random_username_length: usize,
    /// Password length in random mode
    pub random_password_length: usize,
    /// Per-request timeout
    #[serde(with = "serde_duration")]
    pub request_timeout: Duration,
    /// How often the controller re-evaluates the ramp
    #[serde(with = "serde_duration")]
    pub tick_interval: Duration,
    /// How long to wait for stopped users at the end of a run; the request
    /// timeout when unset
    #[serde(with = "serde_duration::option", skip_serializing_if = "Option::is_none")]
    pub grace_period: Option<Duration>,
    /// What happens to in-flight requests of users stopped by a ramp-down
    pub drain_policy: DrainPolicy,
    /// Stage schedule
    pub stages: Vec<Stage>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            mode: CredentialMode::default(),
            fixed_username: DEFAULT_USERNAME.to_string(),
            fixed_password: DEFAULT_PASSWORD.to_string(),
            random_username_length: DEFAULT_USERNAME_LENGTH,
            random_password_length: DEFAULT_PASSWORD_LENGTH,
            request_timeout: DEFAULT_TIMEOUT,
            tick_interval: DEFAULT_TICK_INTERVAL,
            grace_period: None,
            drain_policy: DrainPolicy::default(),
            stages: default_stages(),
        }
    }
}

impl RunConfig {
    /// Set the login endpoint
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the credential mode
    #[must_use]
    pub const fn with_mode(mut self, mode: CredentialMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the fixed-mode credentials
    #[must_use]
    pub fn with_fixed_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.fixed_username = username.into();
        self.fixed_password = password.into();
        self
    }

    /// Set the random-mode credential lengths
    #[must_use]
    pub const fn with_random_lengths(mut self, username: usize, password: usize) -> Self {
        self.random_username_length = username;
        self.random_password_length = password;
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the controller tick
    #[must_use]
    pub const fn with_tick_interval(mut self, tick: Duration) -> Self {
        self.tick_interval = tick;
        self
    }

    /// Set the end-of-run grace period
    #[must_use]
    pub const fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = Some(grace);
        self
    }

    /// Set the drain policy
    #[must_use]
    pub const fn with_drain_policy(mut self, policy: DrainPolicy) -> Self {
        self.drain_policy = policy;
        self
    }

    /// Replace the stage schedule
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<Stage>) -> Self {
        self.stages = stages;
        self
    }

    /// Parse YAML
    pub fn from_yaml(yaml: &str) -> RampaResult<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| RampaError::config_load("<yaml>", e.to_string()))
    }

    /// Parse JSON
    pub fn from_json(json: &str) -> RampaResult<Self> {
        serde_json::from_str(json).map_err(|e| RampaError::config_load("<json>", e.to_string()))
    }

    /// Load from a file: `.json` is read as JSON, anything else as YAML
    pub fn load(path: impl AsRef<Path>) -> RampaResult<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RampaError::config_load(&display, e.to_string()))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml_ng::from_str(&content).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| RampaError::config_load(display, message))
    }

    /// Reject anything that would make the run meaningless
    pub fn validate(&self) -> RampaResult<()> {
        parse_target_url(&self.url)?;
        if self.mode == CredentialMode::Random
            && (self.random_username_length == 0 || self.random_password_length == 0)
        {
            return Err(RampaError::invalid_config(
                "random credential lengths must be greater than zero",
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(RampaError::invalid_config("request_timeout must be greater than zero"));
        }
        if self.tick_interval.is_zero() {
            return Err(RampaError::invalid_config("tick_interval must be greater than zero"));
        }
        self.plan().map(|_| ())
    }

    /// The validated stage schedule
    pub fn plan(&self) -> RampaResult<RunPlan> {
        RunPlan::new(self.stages.clone())
    }

    /// Grace period, falling back to the request timeout
    pub fn effective_grace_period(&self) -> Duration {
        self.grace_period.unwrap_or(self.request_timeout)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> String {
        serde_yaml_ng::to_string(self).unwrap_or_default()
    }
}

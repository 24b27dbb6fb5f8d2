//! Login request generation.
//!
//! One [`RequestGenerator`] covers both credential modes: a constant pair
//! (every request byte-identical) or a fresh random alphanumeric pair per
//! attempt.

use crate::config::RunConfig;
use crate::result::{RampaError, RampaResult};
use rand::distributions::{Alphanumeric, DistString};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default login endpoint
pub const DEFAULT_URL: &str = "http://localhost:8080/login";
/// Default fixed username
pub const DEFAULT_USERNAME: &str = "Test";
/// Default fixed password
pub const DEFAULT_PASSWORD: &str = "MyAwesomePassword1234.";
/// Default random username length
pub const DEFAULT_USERNAME_LENGTH: usize = 8;
/// Default random password length
pub const DEFAULT_PASSWORD_LENGTH: usize = 12;
/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// How credentials are produced for each attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialMode {
    /// Same username/password on every request
    #[default]
    Fixed,
    /// Random alphanumeric username/password per request
    Random,
}

impl std::fmt::Display for CredentialMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed => write!(f, "fixed"),
            Self::Random => write!(f, "random"),
        }
    }
}

/// Login credentials, serialized as `{"username": .., "password": ..}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Create credentials
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Draw a random pair from the 62-character alphanumeric alphabet
    pub fn random<R: Rng + ?Sized>(
        rng: &mut R,
        username_length: usize,
        password_length: usize,
    ) -> Self {
        Self {
            username: Alphanumeric.sample_string(rng, username_length),
            password: Alphanumeric.sample_string(rng, password_length),
        }
    }

    /// JSON request body
    pub fn to_body(&self) -> Vec<u8> {
        // Two plain string fields; serialization has no failure path.
        serde_json::to_vec(self).unwrap_or_default()
    }
}

/// A fully-formed login request
#[derive(Debug, Clone)]
pub struct LoginRequest {
    /// Target URL
    pub url: Url,
    /// JSON body
    pub body: Vec<u8>,
    /// Request headers
    pub headers: HeaderMap,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Builds login requests from a validated [`RunConfig`]
#[derive(Debug, Clone)]
pub struct RequestGenerator {
    url: Url,
    mode: CredentialMode,
    fixed_body: Vec<u8>,
    username_length: usize,
    password_length: usize,
    timeout: Duration,
    headers: HeaderMap,
}

impl RequestGenerator {
    /// Create a generator; fails on a malformed URL or zero-length random
    /// credentials
    pub fn new(config: &RunConfig) -> RampaResult<Self> {
        let url = parse_target_url(&config.url)?;
        if config.mode == CredentialMode::Random
            && (config.random_username_length == 0 || config.random_password_length == 0)
        {
            return Err(RampaError::invalid_config(
                "random credential lengths must be greater than zero",
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let fixed = Credentials::new(&config.fixed_username, &config.fixed_password);

        Ok(Self {
            url,
            mode: config.mode,
            fixed_body: fixed.to_body(),
            username_length: config.random_username_length,
            password_length: config.random_password_length,
            timeout: config.request_timeout,
            headers,
        })
    }

    /// Credential mode
    pub fn mode(&self) -> CredentialMode {
        self.mode
    }

    /// Target URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build the next request using the thread-local RNG
    pub fn build_request(&self) -> LoginRequest {
        self.build_request_with(&mut rand::thread_rng())
    }

    /// Build the next request drawing randomness from `rng`
    pub fn build_request_with<R: Rng + ?Sized>(&self, rng: &mut R) -> LoginRequest {
        let body = match self.mode {
            CredentialMode::Fixed => self.fixed_body.clone(),
            CredentialMode::Random => {
                Credentials::random(rng, self.username_length, self.password_length).to_body()
            }
        };
        LoginRequest {
            url: self.url.clone(),
            body,
            headers: self.headers.clone(),
            timeout: self.timeout,
        }
    }
}

/// Parse and check a target URL: absolute `http`/`https` with a host
pub fn parse_target_url(raw: &str) -> RampaResult<Url> {
    let url = Url::parse(raw)
        .map_err(|e| RampaError::invalid_config(format!("malformed URL {raw:?}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(RampaError::invalid_config(format!(
            "URL {raw:?} must use http or https"
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(RampaError::invalid_config(format!("URL {raw:?} has no host")));
    }
    Ok(url)
}

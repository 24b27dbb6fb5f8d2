//! Rampa: staged virtual-user ramp controller for HTTP login load tests.
//!
//! A run follows a [`RunPlan`]: an ordered list of [`Stage`]s, each a linear
//! ramp of concurrent virtual users toward a target over a duration. Every
//! virtual user loops build → send → check → record until it is told to
//! stop.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        RampController                            │
//! │   tick ─▶ users_at(start, elapsed) ─▶ spawn / stop highest index │
//! └───────────────┬──────────────────────────────────────────────────┘
//!                 │ one tokio task per virtual user
//!                 ▼
//! ┌──────────────────┐   ┌──────────────┐   ┌──────────────────────┐
//! │ RequestGenerator │──▶│ LoginClient  │──▶│ checks + OutcomeTally │
//! │ fixed | random   │   │ (reqwest)    │   │ (atomic counters)     │
//! └──────────────────┘   └──────────────┘   └──────────┬───────────┘
//!                                                      ▼
//!                                                 RunSummary
//! ```
//!
//! # Example
//!
//! ```no_run
//! use rampa::{RunConfig, Stage};
//! use std::time::Duration;
//!
//! # async fn demo() -> rampa::RampaResult<()> {
//! let config = RunConfig::default()
//!     .with_url("http://127.0.0.1:8080/login")
//!     .with_stages(vec![Stage::secs(30, 50), Stage::secs(10, 0)]);
//! let summary = rampa::run(&config).await?;
//! println!("{}", rampa::render_summary_report(&summary));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod check;
pub mod client;
pub mod config;
pub mod controller;
pub mod duration;
pub mod outcome;
pub mod plan;
pub mod request;
pub mod result;
pub mod summary;

pub use check::{evaluate_all, CheckResults, LoginCheck, RESPONSE_CONTAINS_DATA, SUCCESS_LOGIN};
pub use client::{HttpLoginClient, LoginClient};
pub use config::RunConfig;
pub use controller::{DrainPolicy, RampController};
pub use duration::{format_duration, parse_duration};
pub use outcome::{RequestErrorKind, RequestOutcome, SENTINEL_STATUS};
pub use plan::{desired_active, RunPlan, Stage};
pub use request::{CredentialMode, Credentials, LoginRequest, RequestGenerator};
pub use result::{RampaError, RampaResult};
pub use summary::{
    render_summary_json, render_summary_report, CheckCounts, LatencySummary, OutcomeTally,
    RunSummary, StageReport,
};

use std::sync::Arc;

/// Validate `config` and run it to completion against the real HTTP client
pub async fn run(config: &RunConfig) -> RampaResult<RunSummary> {
    config.validate()?;
    let plan = config.plan()?;
    let generator = RequestGenerator::new(config)?;
    let client = Arc::new(HttpLoginClient::new()?);
    RampController::new(config)
        .run(&plan, generator, client)
        .await
}

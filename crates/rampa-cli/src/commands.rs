//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use rampa::{CredentialMode, DrainPolicy, Stage};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Rampa: staged virtual-user load tests for HTTP login endpoints
#[derive(Parser, Debug)]
#[command(name = "rampa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format
    #[arg(long, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ramp virtual users against a login endpoint and report the checks
    Run(RunArgs),

    /// Start the echo login server (POST /login)
    Serve(ServeArgs),

    /// Load and validate a run config without running it
    Validate(ValidateArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Run config file (YAML, or JSON with a .json extension)
    #[arg(short, long, env = "RAMPA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Login endpoint
    #[arg(short, long)]
    pub url: Option<String>,

    /// Credential mode
    #[arg(short, long)]
    pub mode: Option<ModeArg>,

    /// Stage as DURATION:TARGET (repeatable, replaces the config's stages)
    #[arg(short, long = "stage", value_name = "DURATION:TARGET")]
    pub stages: Vec<Stage>,

    /// Per-request timeout (e.g. 60s)
    #[arg(short, long, value_parser = parse_duration_arg)]
    pub timeout: Option<Duration>,

    /// Controller tick (e.g. 100ms)
    #[arg(long, value_parser = parse_duration_arg)]
    pub tick: Option<Duration>,

    /// End-of-run grace period (defaults to the request timeout)
    #[arg(long, value_parser = parse_duration_arg)]
    pub grace: Option<Duration>,

    /// What happens to in-flight requests of users stopped by a ramp-down
    #[arg(long)]
    pub drain: Option<DrainArg>,

    /// Summary format
    #[arg(short, long, default_value = "text")]
    pub format: SummaryFormat,

    /// Exit non-zero when any check failed
    #[arg(long)]
    pub fail_on_check: bool,
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    pub addr: SocketAddr,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Config file to validate
    pub file: PathBuf,
}

/// Credential mode argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// Same credentials on every request
    Fixed,
    /// Random alphanumeric credentials per request
    Random,
}

impl From<ModeArg> for CredentialMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Fixed => Self::Fixed,
            ModeArg::Random => Self::Random,
        }
    }
}

/// Drain policy argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrainArg {
    /// Let in-flight requests finish and record them
    Graceful,
    /// Abort in-flight requests immediately
    Abandon,
}

impl From<DrainArg> for DrainPolicy {
    fn from(arg: DrainArg) -> Self {
        match arg {
            DrainArg::Graceful => Self::Graceful,
            DrainArg::Abandon => Self::Abandon,
        }
    }
}

/// Summary output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SummaryFormat {
    /// Human-readable tables
    #[default]
    Text,
    /// Pretty JSON
    Json,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Log format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormatArg {
    /// Human-readable
    #[default]
    Pretty,
    /// JSON lines
    Json,
}

impl From<LogFormatArg> for crate::config::LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}

fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    rampa::parse_duration(s).map_err(|e| e.to_string())
}

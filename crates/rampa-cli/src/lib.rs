//! Rampa CLI library
//!
//! Command definitions, handlers and the echo login server behind the
//! `rampa` binary.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod config;
pub mod echo_server;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{
    Cli, ColorArg, Commands, DrainArg, LogFormatArg, ModeArg, RunArgs, ServeArgs, SummaryFormat,
    ValidateArgs,
};
pub use config::{CliConfig, ColorChoice, LogFormat, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;

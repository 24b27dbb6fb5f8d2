//! Rampa CLI: staged virtual-user load tests for login endpoints
//!
//! ## Usage
//!
//! ```bash
//! rampa serve                                   # Echo login server on :8080
//! rampa run --stage 30s:100 --stage 10s:0       # Ramp to 100 users and back
//! rampa run --config plan.yaml --format json    # Plan from a file, JSON summary
//! rampa validate plan.yaml                      # Check a plan without running it
//! ```

use clap::Parser;
use rampa_cli::{
    handlers, logging, Cli, CliConfig, CliError, CliResult, ColorChoice, Commands, LogFormat,
    Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    // Build configuration from CLI args
    let config = build_config(&cli);
    logging::init_logging(&config);

    match cli.command {
        Commands::Run(args) => {
            let rt = runtime()?;
            rt.block_on(handlers::execute_run(&config, &args))
        }
        Commands::Serve(args) => {
            let rt = runtime()?;
            rt.block_on(handlers::execute_serve(&config, &args))
        }
        Commands::Validate(args) => handlers::execute_validate(&config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    };

    let color: ColorChoice = cli.color.into();
    let log_format: LogFormat = cli.log_format.into();

    CliConfig::new()
        .with_verbosity(verbosity)
        .with_color(color)
        .with_log_format(log_format)
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::config(format!("Failed to create async runtime: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_verbosity() {
        let cli = Cli::parse_from(["rampa", "-v", "validate", "x.yaml"]);
        assert_eq!(build_config(&cli).verbosity, Verbosity::Verbose);

        let cli = Cli::parse_from(["rampa", "-q", "-vv", "validate", "x.yaml"]);
        assert_eq!(build_config(&cli).verbosity, Verbosity::Quiet);

        let cli = Cli::parse_from(["rampa", "--log-format", "json", "validate", "x.yaml"]);
        assert_eq!(build_config(&cli).log_format, LogFormat::Json);
    }
}

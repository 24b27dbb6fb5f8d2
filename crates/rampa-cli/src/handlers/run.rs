//! Handler for `rampa run`.

use super::{describe_plan, shutdown_signal};
use crate::commands::{RunArgs, SummaryFormat};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use rampa::{
    format_duration, render_summary_json, render_summary_report, HttpLoginClient, RampController,
    RequestGenerator, RunConfig, RunSummary,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

/// Layer command-line flags over the config file (or the defaults) and
/// validate the result
pub fn build_run_config(args: &RunArgs) -> CliResult<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };

    if let Some(url) = &args.url {
        config.url.clone_from(url);
    }
    if let Some(mode) = args.mode {
        config.mode = mode.into();
    }
    if !args.stages.is_empty() {
        config.stages.clone_from(&args.stages);
    }
    if let Some(timeout) = args.timeout {
        config.request_timeout = timeout;
    }
    if let Some(tick) = args.tick {
        config.tick_interval = tick;
    }
    if let Some(grace) = args.grace {
        config.grace_period = Some(grace);
    }
    if let Some(drain) = args.drain {
        config.drain_policy = drain.into();
    }

    config.validate()?;
    Ok(config)
}

/// Execute `rampa run`.
pub async fn execute_run(cli: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let config = build_run_config(args)?;
    let plan = config.plan()?;
    let generator = RequestGenerator::new(&config)?;
    let client = Arc::new(HttpLoginClient::new()?);
    let controller = RampController::new(&config);

    let mut reporter = ProgressReporter::new(cli.use_color(), cli.verbosity.is_quiet());
    reporter.info(&format!("Ramping {}", describe_plan(&config, &plan)));
    if cli.verbosity.is_verbose() {
        reporter.info(&describe_timing(&config));
    }
    reporter.start_progress(plan.total_duration(), "starting");

    let active = controller.active_users();
    let started = Instant::now();
    let run = controller.run_until(&plan, generator, client, shutdown_signal());
    tokio::pin!(run);

    let mut ticker = interval(PROGRESS_INTERVAL);
    let result = loop {
        tokio::select! {
            result = &mut run => break result,
            _ = ticker.tick() => {
                reporter.set_elapsed(started.elapsed());
                reporter.set_message(&format!("{} active users", active.load(Ordering::Relaxed)));
            }
        }
    };
    reporter.finish();

    let summary = result?;
    print_summary(&summary, args.format);
    check_outcome(&reporter, &summary, args.fail_on_check)
}

/// Controller timing, shown with `-v`
fn describe_timing(config: &RunConfig) -> String {
    format!(
        "tick {}, request timeout {}, grace period {}, {} drain",
        format_duration(config.tick_interval),
        format_duration(config.request_timeout),
        format_duration(config.effective_grace_period()),
        config.drain_policy
    )
}

fn print_summary(summary: &RunSummary, format: SummaryFormat) {
    match format {
        SummaryFormat::Text => print!("{}", render_summary_report(summary)),
        SummaryFormat::Json => println!("{}", render_summary_json(summary)),
    }
}

fn check_outcome(
    reporter: &ProgressReporter,
    summary: &RunSummary,
    fail_on_check: bool,
) -> CliResult<()> {
    if summary.all_checks_passed() {
        reporter.success(&format!("{} requests, all checks passed", summary.total_requests));
        return Ok(());
    }

    reporter.failure(&format!(
        "{} of {} requests failed a check",
        summary.failed_outcomes, summary.total_requests
    ));
    if fail_on_check {
        return Err(CliError::ChecksFailed {
            failed: summary.failed_outcomes,
            total: summary.total_requests,
        });
    }
    Ok(())
}

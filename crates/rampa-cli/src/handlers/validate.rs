//! Handler for `rampa validate`.

use super::describe_plan;
use crate::commands::ValidateArgs;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::ProgressReporter;
use rampa::RunConfig;

/// Load `args.file`, validate it and report what it would run.
pub fn execute_validate(cli: &CliConfig, args: &ValidateArgs) -> CliResult<()> {
    let reporter = ProgressReporter::new(cli.use_color(), cli.verbosity.is_quiet());

    let checked = RunConfig::load(&args.file).and_then(|config| {
        config.validate()?;
        let plan = config.plan()?;
        Ok(describe_plan(&config, &plan))
    });

    match checked {
        Ok(description) => {
            reporter.success(&format!("{}: {}", args.file.display(), description));
            Ok(())
        }
        Err(e) => {
            reporter.failure(&format!("{}: invalid", args.file.display()));
            Err(e.into())
        }
    }
}

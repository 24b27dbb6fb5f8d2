//! Handler for `rampa serve`.

use super::shutdown_signal;
use crate::commands::ServeArgs;
use crate::config::CliConfig;
use crate::echo_server;
use crate::error::CliResult;
use crate::output::ProgressReporter;

/// Execute `rampa serve`: run the echo login server until Ctrl-C.
pub async fn execute_serve(cli: &CliConfig, args: &ServeArgs) -> CliResult<()> {
    let reporter = ProgressReporter::new(cli.use_color(), cli.verbosity.is_quiet());
    reporter.info(&format!(
        "Echo login server on http://{}/login (Ctrl-C to stop)",
        args.addr
    ));
    echo_server::serve(args.addr, shutdown_signal()).await
}

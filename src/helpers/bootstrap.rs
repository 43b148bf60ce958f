use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use human_panic::setup_panic;
use log::debug;

use crate::helpers::logging;

/// Sets up the process and drives `fn_run` to completion on a current-thread runtime.
///
/// `.env` is loaded before the CLI is parsed, so that env-backed arguments can be
/// provided from it. A missing `.env` is fine, a broken one is not.
pub fn run<CliType, F, Fut>(
    fn_cli_parse: fn() -> CliType,
    fn_extract_logging: fn(&CliType) -> &logging::Params,
    fn_run: F,
) -> Result<()>
where
    F: FnOnce(CliType) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    setup_panic!();
    if let Err(env_err) = dotenvy::dotenv() {
        if !env_err.not_found() {
            return Err(env_err).with_context(|| "Failed to load `.env` file");
        }
    }

    let cli = fn_cli_parse();
    let logger_handle = logging::configure_from(fn_extract_logging(&cli))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .with_context(|| "Failed to start Tokio runtime")?;

    let command_result = runtime.block_on(fn_run(cli));

    // Signal listeners are still parked at this point, they are simply dropped
    debug!("Waiting up to 2 seconds for remaining tasks to finish");
    runtime.shutdown_timeout(Duration::from_secs(2));

    // Important with non-direct write mode
    // Handle needs to be kept alive until end of program
    logger_handle.flush();

    command_result
}

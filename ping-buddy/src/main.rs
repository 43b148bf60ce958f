use anyhow::Result;
use clap::Parser;

use ping_crab::helpers::{bootstrap, logging};

/// Reads the run settings from CLI and environment, and drives the run.
mod cmd_logic;
mod model;
/// Builds and executes single ping invocations, and makes sense of their output.
mod ping_call;
/// Presents results, either for humans or as JSON lines.
mod render;
/// Paces the probes and decides when a run is over.
mod schedule;
mod stats;
/// Optional download/upload measurement after a bounded run.
mod throughput;

#[cfg(test)]
mod test_utils;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[clap(flatten)]
    logging: logging::Params,

    #[clap(flatten)]
    run: cmd_logic::Params,

    #[clap(flatten)]
    ping: ping_call::Params,

    #[clap(flatten)]
    throughput: throughput::Params,
}

fn main() -> Result<()> {
    bootstrap::run(Cli::parse, |cli: &Cli| &cli.logging, do_run)
}

async fn do_run(cli: Cli) -> Result<()> {
    cmd_logic::handle(cli.run, cli.ping, cli.throughput).await
}

use anyhow::{Context, Result};
use clap::builder::NonEmptyStringValueParser;
use clap::Args;
use log::{debug, error, warn};
use ping_crab::helpers::stop;
use tokio_util::sync::CancellationToken;

use crate::model::RunConfig;
use crate::ping_call::{self, Prober};
use crate::render::{ConsoleRenderer, JsonRenderer, Renderer};
use crate::schedule::Scheduler;
use crate::throughput;

#[derive(Args, Clone, Debug)]
#[group(id = "run")]
pub struct Params {
    /// Host name or IP address to ping
    #[arg(env = "PING_TARGET", value_parser = NonEmptyStringValueParser::new())]
    target: String,

    /// How many probes to send. Without this, keeps going until interrupted (Ctrl-C)
    #[arg(
        short,
        long,
        env = "PING_COUNT",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    count: Option<u64>,

    /// Wait between two probes, in milliseconds
    #[arg(
        short,
        long,
        env = "PING_INTERVAL_MS",
        default_value = "1000",
        value_parser = clap::value_parser!(u64).range(100..)
    )]
    interval_ms: u64,

    /// Per-probe timeout handed to ping, in seconds
    #[arg(
        short,
        long,
        env = "PING_TIMEOUT_SECS",
        default_value = "5",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout_secs: u64,

    /// Print one JSON object per line instead of human-readable output
    #[arg(long, env = "PING_JSON", default_value = "false")]
    json: bool,
}

impl Params {
    pub fn to_run_config(&self) -> RunConfig {
        RunConfig {
            target: self.target.to_string(),
            count: self.count,
            interval_ms: self.interval_ms,
            timeout_secs: self.timeout_secs,
        }
    }
}

pub async fn handle(
    params: Params,
    ping: ping_call::Params,
    throughput: throughput::Params,
) -> Result<()> {
    let config = params.to_run_config();
    let caller = ping.to_caller(&config);
    let command_result = if params.json {
        run_with(&config, caller, JsonRenderer::stdout(), &throughput).await
    } else {
        run_with(&config, caller, ConsoleRenderer::stdout(), &throughput).await
    };
    debug!("Finished command execution. Result: {:?}", command_result);
    command_result
}

async fn run_with<P: Prober, R: Renderer>(
    config: &RunConfig,
    prober: P,
    renderer: R,
    throughput: &throughput::Params,
) -> Result<()> {
    let wants_throughput = throughput.enabled && !config.is_continuous();
    if throughput.enabled && !wants_throughput {
        warn!("Throughput is only measured after runs with --count, skipping it.");
    }

    let stop_rx = subscribe_stop(config)?;
    let mut scheduler = Scheduler::new(prober, renderer);
    let stats = scheduler.run(config, stop_rx).await;
    debug!("Run finished after {} probes", stats.sent());

    if wants_throughput {
        // Ping statistics are already out at this point, a failure here doesn't change them
        match throughput::measure(throughput).await {
            Ok(result) => scheduler.renderer_mut().on_throughput(&result),
            Err(e) => {
                error!("Throughput test failed: {:?}", e);
                scheduler.renderer_mut().on_throughput_failed(&e);
            }
        }
    }
    Ok(())
}

fn subscribe_stop(config: &RunConfig) -> Result<CancellationToken> {
    if !config.is_continuous() {
        // Bounded runs end by themselves, nobody ever cancels this one
        return Ok(CancellationToken::new());
    }
    let sig_handler = stop::listen().context("Failed to install interrupt handler")?;
    let stop_rx = sig_handler.subscribe_stop();
    tokio::spawn(sig_handler.wait_for_signal());
    Ok(stop_rx)
}

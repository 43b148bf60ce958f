use log::{debug, info, trace};
use tokio::select;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::model::{ProbeResult, RunConfig};
use crate::ping_call::Prober;
use crate::render::Renderer;
use crate::stats::RunStatistics;

/// Drives probes one after the other and feeds their outcomes to statistics and renderer.
///
/// At most one probe is in flight at any time, each one is fully resolved (child reaped)
/// before the interval wait for the next one starts.
pub struct Scheduler<P, R> {
    prober: P,
    renderer: R,
    stats: RunStatistics,
    attempt: u64,
    summary_emitted: bool,
}

impl<P: Prober, R: Renderer> Scheduler<P, R> {
    pub fn new(prober: P, renderer: R) -> Self {
        Scheduler {
            prober,
            renderer,
            stats: RunStatistics::new(),
            attempt: 0,
            summary_emitted: false,
        }
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Runs `config.count` probes, or probes until `stop_rx` is cancelled if there is no
    /// count. The stop token is only consulted in the latter case. Either way the summary
    /// is rendered exactly once before this returns.
    pub async fn run(&mut self, config: &RunConfig, stop_rx: CancellationToken) -> RunStatistics {
        self.renderer.on_start(config);
        match config.count {
            Some(count) => self.run_bounded(config, count).await,
            None => self.run_until_stopped(config, stop_rx).await,
        }
        self.emit_summary(config);
        self.stats.clone()
    }

    async fn run_bounded(&mut self, config: &RunConfig, count: u64) {
        debug!("Sending {} probes to {}", count, config.target);
        for remaining in (0..count).rev() {
            let result = self.prober.probe().await;
            self.complete(result);
            if remaining > 0 {
                sleep(config.interval()).await;
            }
        }
    }

    async fn run_until_stopped(&mut self, config: &RunConfig, stop_rx: CancellationToken) {
        info!("Probing {} until interrupted", config.target);
        loop {
            let result = select! {
                biased; // Stop should take prio
                _ = stop_rx.cancelled() => {
                    // Dropping the probe future kills the child, no need to wait for it
                    trace!("Cancellation signal received while probing.");
                    return;
                }
                result = self.prober.probe() => result,
            };
            self.complete(result);

            select! {
                biased;
                _ = stop_rx.cancelled() => {
                    trace!("Cancellation signal received while waiting.");
                    return;
                }
                _ = sleep(config.interval()) => {}
            }
        }
    }

    fn complete(&mut self, result: ProbeResult) {
        self.attempt += 1;
        self.stats.record(&result);
        self.renderer.on_result(self.attempt, &result);
    }

    fn emit_summary(&mut self, config: &RunConfig) {
        if self.summary_emitted {
            trace!("Summary was already emitted, not doing it again.");
            return;
        }
        self.summary_emitted = true;
        self.renderer.on_summary(config, &self.stats);
    }
}

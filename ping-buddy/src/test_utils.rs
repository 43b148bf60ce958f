use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};

use crate::model::{ProbeResult, RunConfig};
use crate::ping_call::Prober;
use crate::render::Renderer;
use crate::stats::RunStatistics;
use crate::throughput::{ThroughputError, ThroughputResult};

pub fn config(count: Option<u64>) -> RunConfig {
    RunConfig {
        target: "example.test".to_string(),
        count,
        interval_ms: 1000,
        timeout_secs: 2,
    }
}

pub fn success(round_trip_ms: u32) -> ProbeResult {
    ProbeResult::Success {
        ip: "10.0.0.1".to_string(),
        bytes_returned: 64,
        round_trip_ms,
        ttl: 64,
        sequence: None,
    }
}

/// Hands out the scripted results in order, then times out forever.
#[derive(Default)]
pub struct ScriptedProber {
    script: VecDeque<ProbeResult>,
    delay: Option<Duration>,
    pub probed_at: Vec<Instant>,
}

impl ScriptedProber {
    pub fn new(script: Vec<ProbeResult>) -> Self {
        ScriptedProber {
            script: script.into(),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&mut self) -> ProbeResult {
        self.probed_at.push(Instant::now());
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
        self.script.pop_front().unwrap_or(ProbeResult::Timeout)
    }
}

/// Like a ping that never comes back.
pub struct HangingProber;

#[async_trait]
impl Prober for HangingProber {
    async fn probe(&mut self) -> ProbeResult {
        std::future::pending().await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Start(RunConfig),
    Result(u64, ProbeResult),
    Summary(RunStatistics),
    Throughput(ThroughputResult),
    ThroughputFailed(String),
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub events: Vec<Rendered>,
}

impl RecordingRenderer {
    pub fn summaries(&self) -> Vec<RunStatistics> {
        self.events
            .iter()
            .filter_map(|it| match it {
                Rendered::Summary(stats) => Some(stats.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn on_start(&mut self, config: &RunConfig) {
        self.events.push(Rendered::Start(config.clone()));
    }

    fn on_result(&mut self, attempt: u64, result: &ProbeResult) {
        self.events.push(Rendered::Result(attempt, result.clone()));
    }

    fn on_summary(&mut self, _config: &RunConfig, stats: &RunStatistics) {
        self.events.push(Rendered::Summary(stats.clone()));
    }

    fn on_throughput(&mut self, result: &ThroughputResult) {
        self.events.push(Rendered::Throughput(*result));
    }

    fn on_throughput_failed(&mut self, error: &ThroughputError) {
        self.events.push(Rendered::ThroughputFailed(error.to_string()));
    }
}

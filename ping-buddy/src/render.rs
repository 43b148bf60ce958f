use std::error::Error;
use std::io::{self, Stdout, Write};
use std::iter;

use chrono::Local;
use log::warn;
use serde::Serialize;

use crate::model::{ProbeResult, RunConfig};
use crate::stats::{RunStatistics, Summary};
use crate::throughput::{ThroughputError, ThroughputResult};

/// Presents what the run loop produces. Attempt numbers start at 1.
pub trait Renderer {
    fn on_start(&mut self, config: &RunConfig);
    fn on_result(&mut self, attempt: u64, result: &ProbeResult);
    /// Called exactly once per run.
    fn on_summary(&mut self, config: &RunConfig, stats: &RunStatistics);
    fn on_throughput(&mut self, result: &ThroughputResult);
    fn on_throughput_failed(&mut self, error: &ThroughputError);
}

/// Human-readable, timestamped lines.
pub struct ConsoleRenderer<W: Write> {
    out: W,
}

impl ConsoleRenderer<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        ConsoleRenderer { out }
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            warn!("Unable to write to output: {}", e);
        }
    }

    fn stamped(&mut self, attempt: u64, text: &str) {
        let now = Local::now().format("%H:%M:%S%.3f");
        self.line(&format!("[{}] #{} {}", now, attempt, text));
    }
}

impl<W: Write> Renderer for ConsoleRenderer<W> {
    fn on_start(&mut self, config: &RunConfig) {
        let how_many = match config.count {
            Some(1) => "1 probe".to_string(),
            Some(count) => format!("{} probes", count),
            None => "until interrupted".to_string(),
        };
        self.line(&format!(
            "PING {}: {}, {} ms apart, {} s timeout",
            config.target, how_many, config.interval_ms, config.timeout_secs
        ));
    }

    fn on_result(&mut self, attempt: u64, result: &ProbeResult) {
        match result {
            ProbeResult::Success {
                ip,
                bytes_returned,
                round_trip_ms,
                ttl,
                sequence,
            } => {
                let seq = sequence.map(|it| format!("seq={} ", it)).unwrap_or_default();
                self.stamped(
                    attempt,
                    &format!(
                        "{} bytes from {}: {}ttl={} time={} ms",
                        bytes_returned, ip, seq, ttl, round_trip_ms
                    ),
                )
            }
            ProbeResult::Timeout => self.stamped(attempt, "Request timed out"),
            ProbeResult::Unreachable => self.stamped(attempt, "Destination host unreachable"),
            ProbeResult::SpawnError { message } => {
                self.stamped(attempt, &format!("Failed to launch ping: {}", message))
            }
            ProbeResult::Unknown { raw_output } if raw_output.trim().is_empty() => {
                self.stamped(attempt, "Unrecognised ping output (nothing on stdout)")
            }
            ProbeResult::Unknown { raw_output } => {
                self.stamped(attempt, "Unrecognised ping output:");
                for raw_line in raw_output.lines().filter(|it| !it.trim().is_empty()) {
                    self.line(&format!("    {}", raw_line.trim_end()));
                }
            }
        }
    }

    fn on_summary(&mut self, config: &RunConfig, stats: &RunStatistics) {
        let summary = stats.summarize();
        self.line("");
        self.line(&format!("--- {} ping statistics ---", config.target));
        self.line(&format!(
            "{} probes sent, {} received, {:.1}% loss",
            summary.sent, summary.received, summary.loss_percent
        ));
        if let Some(latency) = summary.latency {
            self.line(&format!(
                "rtt min/avg/max = {}/{:.1}/{} ms",
                latency.min_ms, latency.avg_ms, latency.max_ms
            ));
        }
    }

    fn on_throughput(&mut self, result: &ThroughputResult) {
        self.line(&format!(
            "Throughput: {:.2} Mbps down, {:.2} Mbps up",
            result.download_mbps, result.upload_mbps
        ));
    }

    fn on_throughput_failed(&mut self, error: &ThroughputError) {
        self.line(&format!("Throughput test failed: {}", error_chain(error)));
    }
}

fn error_chain(error: &(dyn Error + 'static)) -> String {
    iter::successors(Some(error), |&it| it.source())
        .map(|it| it.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Event<'a> {
    Start {
        timestamp: String,
        config: &'a RunConfig,
    },
    Result {
        timestamp: String,
        attempt: u64,
        result: &'a ProbeResult,
    },
    Summary {
        timestamp: String,
        target: &'a str,
        summary: Summary,
    },
    Throughput {
        timestamp: String,
        result: &'a ThroughputResult,
    },
    ThroughputFailed {
        timestamp: String,
        message: String,
    },
}

/// One JSON object per line, for piping into other tools.
pub struct JsonRenderer<W: Write> {
    out: W,
}

impl JsonRenderer<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        JsonRenderer { out }
    }

    fn emit(&mut self, event: &Event) {
        let res = serde_json::to_writer(&mut self.out, event)
            .map_err(io::Error::from)
            .and_then(|_| writeln!(self.out))
            .and_then(|_| self.out.flush());
        if let Err(e) = res {
            warn!("Unable to write event to output: {}", e);
        }
    }
}

fn timestamp() -> String {
    Local::now().to_rfc3339()
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn on_start(&mut self, config: &RunConfig) {
        self.emit(&Event::Start {
            timestamp: timestamp(),
            config,
        });
    }

    fn on_result(&mut self, attempt: u64, result: &ProbeResult) {
        self.emit(&Event::Result {
            timestamp: timestamp(),
            attempt,
            result,
        });
    }

    fn on_summary(&mut self, config: &RunConfig, stats: &RunStatistics) {
        self.emit(&Event::Summary {
            timestamp: timestamp(),
            target: &config.target,
            summary: stats.summarize(),
        });
    }

    fn on_throughput(&mut self, result: &ThroughputResult) {
        self.emit(&Event::Throughput {
            timestamp: timestamp(),
            result,
        });
    }

    fn on_throughput_failed(&mut self, error: &ThroughputError) {
        self.emit(&Event::ThroughputFailed {
            timestamp: timestamp(),
            message: error_chain(error),
        });
    }
}

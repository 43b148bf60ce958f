use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

use crate::model::ProbeResult;

/// Running counts for one invocation.
///
/// Only the run loop mutates this, once per completed probe. `received` always equals
/// the number of recorded latencies and never exceeds `sent`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStatistics {
    sent: u64,
    received: u64,
    latencies: Vec<u32>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &ProbeResult) {
        self.sent += 1;
        if let Some(round_trip_ms) = result.round_trip_ms() {
            self.received += 1;
            self.latencies.push(round_trip_ms);
        }
    }

    pub fn fold(mut self, result: &ProbeResult) -> Self {
        self.record(result);
        self
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn latencies(&self) -> &[u32] {
        &self.latencies
    }

    /// `0` if nothing was sent yet.
    pub fn loss_percent(&self) -> f64 {
        if self.sent == 0 {
            return 0.0;
        }
        (self.sent - self.received) as f64 / self.sent as f64 * 100.0
    }

    pub fn summarize(&self) -> Summary {
        Summary {
            sent: self.sent,
            received: self.received,
            loss_percent: round_one_decimal(self.loss_percent()),
            latency: self.latency_summary(),
        }
    }

    fn latency_summary(&self) -> Option<LatencySummary> {
        let (min_ms, max_ms) = match self.latencies.iter().minmax() {
            MinMaxResult::NoElements => return None,
            MinMaxResult::OneElement(only) => (*only, *only),
            MinMaxResult::MinMax(min, max) => (*min, *max),
        };
        let total: u64 = self.latencies.iter().map(|it| *it as u64).sum();
        let avg_ms = round_one_decimal(total as f64 / self.latencies.len() as f64);
        Some(LatencySummary {
            min_ms,
            max_ms,
            avg_ms,
        })
    }
}

/// Snapshot for presentation, percentages and averages rounded to one decimal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub sent: u64,
    pub received: u64,
    pub loss_percent: f64,
    /// Absent when nothing came back, rather than a row of zeros
    pub latency: Option<LatencySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencySummary {
    pub min_ms: u32,
    pub max_ms: u32,
    pub avg_ms: f64,
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

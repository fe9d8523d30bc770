use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Pipeline performance counters, updated after every tick.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineMetrics {
    /// Number of completed ticks.
    pub ticks: u64,
    /// Assets scored across all ticks.
    pub assets_scored: u64,
    /// Alert candidates emitted across all ticks.
    pub alerts_emitted: u64,
    /// Indicator failures that were neutralized.
    pub indicator_failures: u64,
    /// When the last tick completed.
    pub last_run: Option<DateTime<Utc>>,
    /// Duration of the last tick in milliseconds.
    pub last_duration_ms: u64,
    /// Scoring throughput of the last tick.
    pub assets_per_second: f64,
}

impl PipelineMetrics {
    /// Record one completed tick.
    pub fn record_tick(
        &mut self,
        assets: u64,
        alerts: u64,
        failures: u64,
        elapsed: Duration,
        finished_at: DateTime<Utc>,
    ) {
        self.ticks += 1;
        self.assets_scored += assets;
        self.alerts_emitted += alerts;
        self.indicator_failures += failures;
        self.last_run = Some(finished_at);
        self.last_duration_ms = elapsed.as_millis() as u64;

        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            self.assets_per_second = assets as f64 / secs;
        }
    }
}

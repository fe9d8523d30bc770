//! Scoring pipeline: one tick of aggregation followed by monitoring.
//!
//! - **Score**: all snapshots are aggregated in parallel (pure).
//! - **Monitor**: composites and the raw events they were built from are fed
//!   to the shared [`ThresholdMonitor`] in input order.

pub mod metrics;


use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use pulse_rules::{AlertCandidate, EngineDocuments, ThresholdMonitor, WhaleActivity};

use crate::aggregator::{CompositeScore, ScoreAggregator};
use crate::indicators::math;
use crate::inputs::{AssetSnapshot, FlowDirection, WhaleInput};

use self::metrics::PipelineMetrics;

/// Window label attached to price-change alerts.
const PRICE_PERIOD: &str = "24h";

/// Whale transfers in one snapshot are treated as one window of this length.
const WHALE_WINDOW_HOURS: u32 = 24;

/// Component name used when an indicator fails.
fn indicator_component(category: pulse_core::Category) -> String {
    format!("indicator.{}", category)
}

/// Output of one tick.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickReport {
    pub scores: Vec<CompositeScore>,
    pub alerts: Vec<AlertCandidate>,
}

/// Aggregator plus monitor, with per-tick metrics.
pub struct ScorePipeline {
    aggregator: ScoreAggregator,
    monitor: ThresholdMonitor,
    pub metrics: PipelineMetrics,
}

impl ScorePipeline {
    pub fn new(aggregator: ScoreAggregator, monitor: ThresholdMonitor) -> Self {
        Self {
            aggregator,
            monitor,
            metrics: PipelineMetrics::default(),
        }
    }

    /// Build from loaded engine documents.
    pub fn from_documents(docs: &EngineDocuments) -> Self {
        Self::new(
            ScoreAggregator::new(docs.scoring.clone()),
            ThresholdMonitor::new(docs.thresholds.clone()),
        )
    }

    pub fn aggregator(&self) -> &ScoreAggregator {
        &self.aggregator
    }

    pub fn aggregator_mut(&mut self) -> &mut ScoreAggregator {
        &mut self.aggregator
    }

    pub fn monitor(&self) -> &ThresholdMonitor {
        &self.monitor
    }

    /// Score every snapshot and collect the alert candidates they trigger.
    pub fn run_tick(&mut self, snapshots: &[AssetSnapshot], now: DateTime<Utc>) -> TickReport {
        let start = Instant::now();

        let scores = self.aggregator.aggregate_batch(snapshots, now);

        let mut alerts = Vec::new();
        let mut failures = 0u64;
        for (snapshot, composite) in snapshots.iter().zip(&scores) {
            failures += composite.failed_categories().len() as u64;
            alerts.extend(feed_monitor(&self.monitor, snapshot, composite, now));
        }
        let pruned = self.monitor.prune_expired(now);

        let elapsed = start.elapsed();
        self.metrics.record_tick(
            scores.len() as u64,
            alerts.len() as u64,
            failures,
            elapsed,
            now,
        );

        info!(
            assets = scores.len(),
            alerts = alerts.len(),
            failures,
            pruned,
            elapsed_ms = elapsed.as_millis() as u64,
            "tick completed"
        );

        TickReport { scores, alerts }
    }
}

/// Run every monitor check that applies to one scored snapshot.
pub fn feed_monitor(
    monitor: &ThresholdMonitor,
    snapshot: &AssetSnapshot,
    composite: &CompositeScore,
    now: DateTime<Utc>,
) -> Vec<AlertCandidate> {
    let id = snapshot.asset_id.as_str();
    let symbol = snapshot.symbol.as_str();
    let inputs = &snapshot.inputs;

    let mut alerts = monitor.check_score(
        id,
        symbol,
        composite.value,
        Some(&composite.per_category),
        now,
    );

    for category in composite.failed_categories() {
        let message = composite.details[&category]
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("indicator failed");
        alerts.extend(monitor.report_system_error(&indicator_component(category), message, now));
    }

    if let Some(whale) = &inputs.whale {
        for tx in &whale.transfers {
            alerts.extend(monitor.check_whale_transaction(
                id,
                symbol,
                tx.amount_usd,
                tx.amount_crypto.unwrap_or(0.0),
                tx.direction.as_str(),
                now,
            ));
        }
        if let Some(activity) = whale_activity(whale) {
            alerts.extend(monitor.check_whale_pattern(id, symbol, &activity, now));
        }
    }

    let price_change = inputs
        .volume
        .as_ref()
        .and_then(|v| v.price_change_percent)
        .or_else(|| inputs.open_interest.as_ref().and_then(|oi| oi.price_change_percent));
    if let (Some(change), Some(price)) = (price_change, snapshot.price) {
        alerts.extend(monitor.check_price_change(id, symbol, change, price, PRICE_PERIOD, now));
    }

    if let Some(volume) = &inputs.volume {
        if !volume.historical_volumes.is_empty() {
            let avg = math::mean(&volume.historical_volumes);
            alerts.extend(monitor.check_volume_spike(id, symbol, volume.current_volume, avg, now));
        }
    }

    debug!(symbol = %symbol, alerts = alerts.len(), "monitor checks done");
    alerts
}

/// Summarize a snapshot's whale transfers as directional activity.
fn whale_activity(input: &WhaleInput) -> Option<WhaleActivity> {
    if input.transfers.is_empty() {
        return None;
    }
    let sum = |dir: FlowDirection| -> f64 {
        input
            .transfers
            .iter()
            .filter(|t| t.direction == dir)
            .map(|t| t.amount_usd)
            .sum()
    };
    Some(WhaleActivity {
        tx_count: input.transfers.len(),
        window_hours: WHALE_WINDOW_HOURS,
        inflow_usd: sum(FlowDirection::Inflow),
        outflow_usd: sum(FlowDirection::Outflow),
    })
}

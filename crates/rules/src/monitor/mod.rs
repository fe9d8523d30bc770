//! Threshold and hysteresis monitoring.
//!
//! The [`ThresholdMonitor`] turns composite scores and raw market events
//! into [`AlertCandidate`](crate::AlertCandidate)s, suppressing repeats with
//! per-`(kind, symbol)` cooldowns and only firing the high-zone alert on
//! zone entry.

mod core;
mod state;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

pub use self::core::ThresholdMonitor;

/// Symbol and asset id carried by system alerts.
pub const SYSTEM_SYMBOL: &str = "SYSTEM";

/// Share of total volume the net flow must exceed to count as directional.
const DIRECTION_SHARE: f64 = 0.10;

/// Aggregated whale flow for one symbol over a time window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WhaleActivity {
    pub tx_count: usize,
    pub window_hours: u32,
    /// USD moved into custodial venues.
    pub inflow_usd: f64,
    /// USD moved out of custodial venues.
    pub outflow_usd: f64,
}

/// Direction of whale flow relative to custodial venues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhaleDirection {
    /// Net outflow: coins leaving exchanges.
    Accumulation,
    /// Net inflow: coins heading to exchanges.
    Distribution,
    Neutral,
}

impl WhaleActivity {
    pub fn total_usd(&self) -> f64 {
        self.inflow_usd + self.outflow_usd
    }

    /// Outflow minus inflow.
    pub fn net_flow_usd(&self) -> f64 {
        self.outflow_usd - self.inflow_usd
    }

    pub fn direction(&self) -> WhaleDirection {
        let total = self.total_usd();
        let net = self.net_flow_usd();
        if net > total * DIRECTION_SHARE {
            WhaleDirection::Accumulation
        } else if net < -total * DIRECTION_SHARE {
            WhaleDirection::Distribution
        } else {
            WhaleDirection::Neutral
        }
    }
}

/// Counters exposed for health endpoints and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorStats {
    pub check_count: u64,
    pub alert_count: u64,
    pub active_cooldowns: usize,
    pub tracked_symbols: usize,
}

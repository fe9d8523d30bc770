//! Per-category input records.
//!
//! Collectors build these from exchange, chain and news data. Every field
//! has a serde default so partial JSON snapshots deserialize; an empty
//! record scores neutral rather than failing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Whale ───────────────────────────────────────────────────────────

/// Direction of a transfer relative to custodial venues (exchanges).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowDirection {
    /// Into an exchange.
    #[serde(alias = "to_exchange")]
    Inflow,
    /// Out of an exchange.
    #[serde(alias = "from_exchange")]
    Outflow,
    /// Wallet to wallet, or unknown.
    #[default]
    #[serde(other)]
    Other,
}

impl FlowDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowDirection::Inflow => "inflow",
            FlowDirection::Outflow => "outflow",
            FlowDirection::Other => "transfer",
        }
    }
}

/// One large on-chain transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhaleTransfer {
    pub amount_usd: f64,
    #[serde(default)]
    pub amount_crypto: Option<f64>,
    #[serde(default)]
    pub direction: FlowDirection,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhaleInput {
    pub transfers: Vec<WhaleTransfer>,
    /// Average whale USD volume per window over the lookback period.
    pub historical_avg_volume_usd: f64,
    /// Average whale transaction count per window.
    pub historical_avg_count: f64,
}

// ── Volume ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeInput {
    pub current_volume: f64,
    /// Same-timeframe volumes, oldest first.
    pub historical_volumes: Vec<f64>,
    /// Price change over the same window; treated as flat when absent.
    pub price_change_percent: Option<f64>,
}

// ── Netflow ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetflowInput {
    pub inflow_usd: f64,
    pub outflow_usd: f64,
    /// Past net flows (inflow minus outflow), oldest first.
    pub historical_netflows: Vec<f64>,
    /// Circulating supply valued in USD, when known.
    pub supply_usd: Option<f64>,
}

// ── Open interest ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenInterestInput {
    pub current_oi: f64,
    pub previous_oi: f64,
    pub price_change_percent: Option<f64>,
    /// Perpetual funding rate as a fraction (0.0001 = 0.01%).
    pub funding_rate: Option<f64>,
    pub long_short_ratio: Option<f64>,
}

// ── Narrative ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    #[serde(alias = "positive")]
    Bullish,
    #[serde(alias = "negative")]
    Bearish,
    #[default]
    #[serde(other)]
    Neutral,
}

impl SentimentLabel {
    /// Numeric sentiment on the [-1, 1] scale.
    pub fn value(&self) -> f64 {
        match self {
            SentimentLabel::Bullish => 0.7,
            SentimentLabel::Bearish => -0.7,
            SentimentLabel::Neutral => 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsItem {
    pub title: String,
    pub summary: String,
    pub sentiment: SentimentLabel,
    pub published_at: Option<DateTime<Utc>>,
}

/// A classified event such as a listing or a hack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeInput {
    /// Recent news, oldest first.
    pub news: Vec<NewsItem>,
    /// Model sentiment scores in [-1, 1], oldest first. Preferred over labels.
    pub sentiment_scores: Vec<f64>,
    pub mention_count: u64,
    pub historical_mention_avg: f64,
    pub events: Vec<NarrativeEvent>,
}

// ── Per-asset bundle ────────────────────────────────────────────────

/// Everything collected for one asset in one evaluation pass.
///
/// A missing category is scored from its empty default, which yields the
/// neutral 50.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetInputs {
    pub whale: Option<WhaleInput>,
    pub volume: Option<VolumeInput>,
    pub netflow: Option<NetflowInput>,
    pub open_interest: Option<OpenInterestInput>,
    pub narrative: Option<NarrativeInput>,
}

/// An asset snapshot as read by the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSnapshot {
    pub asset_id: String,
    pub symbol: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub inputs: AssetInputs,
}

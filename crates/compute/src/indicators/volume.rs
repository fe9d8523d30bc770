//! Volume indicator: unusual trading volume against its own history.

use chrono::{DateTime, Utc};
use pulse_core::Category;
use serde_json::json;
use tracing::debug;

use super::math::{self, round2};
use super::{
    blend, ensure_finite, ensure_non_negative, into_details, sub_scores, Indicator, IndicatorError,
    IndicatorScore,
};
use crate::inputs::VolumeInput;

const WEIGHT_ZSCORE: f64 = 0.4;
const WEIGHT_TREND: f64 = 0.3;
const WEIGHT_RATIO: f64 = 0.3;

const MIN_HISTORY: usize = 3;
const TREND_WINDOW: usize = 6;
const MIN_TREND_POINTS: usize = 4;

/// z-score from which a volume print counts as an anomaly.
const ANOMALY_Z: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trend {
    Up,
    Down,
    Flat,
    Unknown,
}

impl Trend {
    fn as_str(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Flat => "flat",
            Trend::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VolumeIndicator;

impl Indicator for VolumeIndicator {
    type Input = VolumeInput;
    const CATEGORY: Category = Category::Volume;

    fn evaluate(
        &self,
        input: &VolumeInput,
        _now: DateTime<Utc>,
    ) -> Result<IndicatorScore, IndicatorError> {
        let cat = Self::CATEGORY;
        ensure_non_negative(cat, "current_volume", input.current_volume)?;
        let price_change = input.price_change_percent.unwrap_or(0.0);
        ensure_finite(cat, "price_change_percent", price_change)?;
        for v in &input.historical_volumes {
            ensure_non_negative(cat, "historical_volumes", *v)?;
        }

        let history = &input.historical_volumes;
        if history.len() < MIN_HISTORY {
            return Ok(IndicatorScore::neutral(cat, "insufficient volume history").with(json!({
                "history_points": history.len(),
            })));
        }

        let avg = math::mean(history);
        let z = math::z_score(input.current_volume, history);
        let (trend, strength) = trend(history);
        let ratio = if avg > 0.0 { input.current_volume / avg } else { 0.0 };

        let z_part = z_score_to_score(z);
        let trend_part = trend_score(trend, strength, price_change);
        let ratio_part = if avg > 0.0 {
            math::log_ratio_score(ratio)
        } else {
            math::NEUTRAL
        };

        let parts = [
            ("z_score", z_part, WEIGHT_ZSCORE),
            ("trend", trend_part, WEIGHT_TREND),
            ("ratio", ratio_part, WEIGHT_RATIO),
        ];
        let mut score = blend(&parts);

        // Abnormal volume on a rising price is the classic breakout shape.
        let price_confirmed = z > 1.5 && price_change > 2.0;
        if price_confirmed {
            score = (score + 10.0).min(100.0);
        }

        let anomaly = z >= ANOMALY_Z;
        let (subs, weights) = sub_scores(&parts);

        debug!(score, z, ratio, trend = trend.as_str(), anomaly, "volume indicator evaluated");

        let details = into_details(json!({
            "current_volume": input.current_volume,
            "average_volume": avg,
            "volume_ratio": round2(ratio),
            "z_score": round2(z),
            "trend": trend.as_str(),
            "trend_strength": round2(strength),
            "price_change_percent": price_change,
            "price_confirmed": price_confirmed,
            "anomaly_detected": anomaly,
            "sub_scores": subs,
            "weights": weights,
            "reason": reason(z, ratio, trend),
        }));
        Ok(IndicatorScore::new(cat, score, details))
    }
}

/// Piecewise z-score mapping, saturating at 95 on the high side and 15 on the low.
pub(crate) fn z_score_to_score(z: f64) -> f64 {
    if z >= 3.0 {
        (80.0 + (z - 3.0) * 5.0).min(95.0)
    } else if z >= 2.0 {
        70.0 + (z - 2.0) * 10.0
    } else if z >= 1.0 {
        55.0 + (z - 1.0) * 15.0
    } else if z >= -1.0 {
        45.0 + 10.0 * z
    } else {
        (30.0 + (z + 2.0) * 7.5).max(15.0)
    }
}

/// Trend over the last few history points, normalized by their mean.
fn trend(history: &[f64]) -> (Trend, f64) {
    let start = history.len().saturating_sub(TREND_WINDOW);
    let window = &history[start..];
    if window.len() < MIN_TREND_POINTS {
        return (Trend::Unknown, 0.0);
    }
    let m = math::mean(window);
    if m <= 0.0 {
        return (Trend::Flat, 0.0);
    }
    let normalized: Vec<f64> = window.iter().map(|v| v / m).collect();
    let slope = math::slope(&normalized);
    let corr = math::correlation(&normalized);
    let strength = corr.abs();
    let trend = if slope > 0.05 && corr > 0.3 {
        Trend::Up
    } else if slope < -0.05 && corr < -0.3 {
        Trend::Down
    } else {
        Trend::Flat
    };
    (trend, strength)
}

fn trend_score(trend: Trend, strength: f64, price_change: f64) -> f64 {
    match trend {
        Trend::Up => {
            let price_bonus = if price_change > 0.0 { price_change.min(10.0) } else { 0.0 };
            60.0 + 20.0 * strength + price_bonus
        }
        Trend::Down => 40.0 - 15.0 * strength,
        Trend::Flat | Trend::Unknown => math::NEUTRAL,
    }
}

fn reason(z: f64, ratio: f64, trend: Trend) -> String {
    let level = if z >= ANOMALY_Z {
        format!("volume anomaly ({:.1} std above average)", z)
    } else if ratio >= 1.5 {
        format!("volume {:.1}x the average", ratio)
    } else if ratio > 0.0 && ratio <= 0.5 {
        "volume well below average".to_string()
    } else {
        "volume near average".to_string()
    };
    match trend {
        Trend::Up => format!("{}; rising trend", level),
        Trend::Down => format!("{}; falling trend", level),
        _ => level,
    }
}

//! Derivatives positioning: open interest change, OI/price divergence,
//! funding rate and the long/short ratio.
//!
//! Crowded shorts (negative funding, ratio below 1) score bullish because
//! they set up squeezes.

use chrono::{DateTime, Utc};
use pulse_core::Category;
use serde_json::json;
use tracing::debug;

use super::math::round2;
use super::{
    blend, ensure_finite, ensure_non_negative, into_details, sub_scores, Indicator, IndicatorError,
    IndicatorScore,
};
use crate::inputs::OpenInterestInput;

const WEIGHT_OI_CHANGE: f64 = 0.35;
const WEIGHT_DIVERGENCE: f64 = 0.30;
const WEIGHT_FUNDING: f64 = 0.20;
const WEIGHT_RATIO: f64 = 0.15;

/// OI moves beyond this percentage count as meaningful.
const OI_MOVE: f64 = 5.0;
/// Price moves beyond this percentage count as meaningful.
const PRICE_MOVE: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Regime {
    BullishContinuation,
    PotentialShortSqueeze,
    ShortSqueezeInProgress,
    LongLiquidation,
    BuildingPositions,
    ClosingPositions,
    Neutral,
}

impl Regime {
    fn classify(oi_change: f64, price_change: f64) -> Self {
        if oi_change > OI_MOVE && price_change > PRICE_MOVE {
            Regime::BullishContinuation
        } else if oi_change > OI_MOVE && price_change < -PRICE_MOVE {
            Regime::PotentialShortSqueeze
        } else if oi_change < -OI_MOVE && price_change > PRICE_MOVE {
            Regime::ShortSqueezeInProgress
        } else if oi_change < -OI_MOVE && price_change < -PRICE_MOVE {
            Regime::LongLiquidation
        } else if oi_change > 0.0 {
            Regime::BuildingPositions
        } else if oi_change < 0.0 {
            Regime::ClosingPositions
        } else {
            Regime::Neutral
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Regime::BullishContinuation => "bullish_continuation",
            Regime::PotentialShortSqueeze => "potential_short_squeeze",
            Regime::ShortSqueezeInProgress => "short_squeeze_in_progress",
            Regime::LongLiquidation => "long_liquidation",
            Regime::BuildingPositions => "building_positions",
            Regime::ClosingPositions => "closing_positions",
            Regime::Neutral => "neutral",
        }
    }

    fn score(&self, oi_change: f64) -> f64 {
        match self {
            Regime::BullishContinuation => 75.0 + (oi_change / 2.0).min(15.0),
            Regime::PotentialShortSqueeze => 70.0 + (oi_change / 2.0).min(15.0),
            Regime::ShortSqueezeInProgress => 65.0,
            Regime::LongLiquidation => 30.0 - (oi_change.abs() / 2.0).min(10.0),
            _ => 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenInterestIndicator;

impl Indicator for OpenInterestIndicator {
    type Input = OpenInterestInput;
    const CATEGORY: Category = Category::OpenInterest;

    fn evaluate(
        &self,
        input: &OpenInterestInput,
        _now: DateTime<Utc>,
    ) -> Result<IndicatorScore, IndicatorError> {
        let cat = Self::CATEGORY;
        ensure_non_negative(cat, "current_oi", input.current_oi)?;
        ensure_non_negative(cat, "previous_oi", input.previous_oi)?;

        let price_change = input.price_change_percent.unwrap_or(0.0);
        let funding = input.funding_rate.unwrap_or(0.0);
        let long_short = input.long_short_ratio.unwrap_or(1.0);
        ensure_finite(cat, "price_change_percent", price_change)?;
        ensure_finite(cat, "funding_rate", funding)?;
        ensure_non_negative(cat, "long_short_ratio", long_short)?;

        if input.current_oi == 0.0 && input.previous_oi == 0.0 {
            return Ok(IndicatorScore::neutral(cat, "open interest data unavailable").with(json!({
                "current_oi": 0.0,
                "oi_change_percent": 0.0,
                "funding_rate": funding,
                "long_short_ratio": long_short,
            })));
        }

        let oi_change = if input.previous_oi > 0.0 {
            (input.current_oi - input.previous_oi) / input.previous_oi * 100.0
        } else {
            0.0
        };
        let regime = Regime::classify(oi_change, price_change);

        let parts = [
            ("oi_change", oi_change_score(oi_change), WEIGHT_OI_CHANGE),
            ("divergence", regime.score(oi_change), WEIGHT_DIVERGENCE),
            ("funding", funding_score(funding), WEIGHT_FUNDING),
            ("long_short", long_short_score(long_short), WEIGHT_RATIO),
        ];
        let score = blend(&parts);
        let (subs, weights) = sub_scores(&parts);

        debug!(
            score,
            oi_change,
            funding,
            regime = regime.as_str(),
            "open interest indicator evaluated"
        );

        let details = into_details(json!({
            "current_oi": input.current_oi,
            "previous_oi": input.previous_oi,
            "oi_change_percent": round2(oi_change),
            "price_change_percent": price_change,
            "funding_rate": funding,
            "long_short_ratio": long_short,
            "interpretation": regime.as_str(),
            "sub_scores": subs,
            "weights": weights,
            "reason": reason(oi_change, price_change, funding),
        }));
        Ok(IndicatorScore::new(cat, score, details))
    }
}

pub(crate) fn oi_change_score(c: f64) -> f64 {
    if c >= 20.0 {
        85.0
    } else if c >= 10.0 {
        70.0 + (c - 10.0) * 1.5
    } else if c >= 5.0 {
        60.0 + (c - 5.0) * 2.0
    } else if c >= -5.0 {
        50.0 + c * 2.0
    } else if c >= -10.0 {
        40.0 + (c + 5.0) * 2.0
    } else {
        (30.0 + (c + 10.0)).max(20.0)
    }
}

/// Negative funding means shorts pay longs.
pub(crate) fn funding_score(f: f64) -> f64 {
    if f <= -0.0005 {
        75.0 + (f.abs() * 10_000.0).min(15.0)
    } else if f <= 0.0 {
        60.0 + f.abs() * 5_000.0
    } else if f <= 0.0005 {
        50.0
    } else if f <= 0.001 {
        45.0
    } else {
        (45.0 - (f - 0.001) * 5_000.0).max(30.0)
    }
}

pub(crate) fn long_short_score(r: f64) -> f64 {
    if r < 0.8 {
        75.0 + ((1.0 - r) * 30.0).min(15.0)
    } else if r < 1.0 {
        60.0 + (1.0 - r) * 50.0
    } else if r < 1.2 {
        50.0 + (r - 1.0) * 25.0
    } else if r < 1.5 {
        55.0
    } else {
        (55.0 - (r - 1.5) * 20.0).max(35.0)
    }
}

fn reason(oi_change: f64, price_change: f64, funding: f64) -> String {
    let mut parts = Vec::new();
    if oi_change > 10.0 {
        parts.push(format!("open interest surging (+{:.1}%)", oi_change));
    } else if oi_change > OI_MOVE {
        parts.push(format!("open interest rising (+{:.1}%)", oi_change));
    } else if oi_change < -10.0 {
        parts.push(format!("open interest collapsing ({:.1}%)", oi_change));
    } else if oi_change < -OI_MOVE {
        parts.push(format!("open interest falling ({:.1}%)", oi_change));
    }

    if oi_change > OI_MOVE && price_change < -PRICE_MOVE {
        parts.push("possible short squeeze ahead".to_string());
    } else if oi_change < -OI_MOVE && price_change > PRICE_MOVE {
        parts.push("short squeeze under way".to_string());
    }

    if funding < -0.0003 {
        parts.push("negative funding (shorts dominant)".to_string());
    } else if funding > 0.0007 {
        parts.push("elevated funding (caution)".to_string());
    }

    if parts.is_empty() {
        "derivatives positioning normal".to_string()
    } else {
        parts.join("; ")
    }
}

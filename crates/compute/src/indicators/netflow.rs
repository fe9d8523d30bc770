//! Exchange netflow indicator.
//!
//! Netflow is inflow minus outflow to exchanges. Coins leaving exchanges
//! (negative netflow) read as accumulation and score above 50.

use chrono::{DateTime, Utc};
use pulse_core::Category;
use serde_json::json;
use tracing::debug;

use super::math::{self, round2};
use super::{
    blend, ensure_finite, ensure_non_negative, into_details, sub_scores, Indicator, IndicatorError,
    IndicatorScore,
};
use crate::inputs::NetflowInput;

const WEIGHT_NETFLOW: f64 = 0.45;
const WEIGHT_TREND: f64 = 0.30;
const WEIGHT_MAGNITUDE: f64 = 0.25;

/// Below this total flow the signal is noise.
const MIN_TOTAL_FLOW_USD: f64 = 10_000.0;

const MIN_TREND_HISTORY: usize = 3;
const TREND_WINDOW: usize = 5;
const STRONG_SLOPE_USD: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct NetflowIndicator;

impl Indicator for NetflowIndicator {
    type Input = NetflowInput;
    const CATEGORY: Category = Category::Netflow;

    fn evaluate(
        &self,
        input: &NetflowInput,
        _now: DateTime<Utc>,
    ) -> Result<IndicatorScore, IndicatorError> {
        let cat = Self::CATEGORY;
        ensure_non_negative(cat, "inflow_usd", input.inflow_usd)?;
        ensure_non_negative(cat, "outflow_usd", input.outflow_usd)?;
        for v in &input.historical_netflows {
            ensure_finite(cat, "historical_netflows", *v)?;
        }
        if let Some(supply) = input.supply_usd {
            ensure_non_negative(cat, "supply_usd", supply)?;
        }

        let netflow = input.inflow_usd - input.outflow_usd;
        let total = input.inflow_usd + input.outflow_usd;

        if total < MIN_TOTAL_FLOW_USD {
            let details = json!({
                "total_flow_usd": total,
                "interpretation": "low_activity",
            });
            return Ok(
                IndicatorScore::neutral(cat, "low activity: exchange flow too small").with(details),
            );
        }

        let ratio = netflow / total;
        let netflow_part = math::clamp_score(50.0 - 40.0 * ratio);
        let trend_part = trend_score(&input.historical_netflows, netflow);
        let magnitude_part = magnitude_score(total, input.supply_usd);

        let parts = [
            ("netflow", netflow_part, WEIGHT_NETFLOW),
            ("trend", trend_part, WEIGHT_TREND),
            ("magnitude", magnitude_part, WEIGHT_MAGNITUDE),
        ];
        let score = blend(&parts);
        let (subs, weights) = sub_scores(&parts);
        let interpretation = interpret(ratio);

        debug!(score, netflow, total, ratio, interpretation, "netflow indicator evaluated");

        let details = into_details(json!({
            "inflow_usd": input.inflow_usd,
            "outflow_usd": input.outflow_usd,
            "netflow_usd": netflow,
            "total_flow_usd": total,
            "netflow_ratio": round2(ratio),
            "interpretation": interpretation,
            "sub_scores": subs,
            "weights": weights,
            "reason": reason(netflow, ratio, total),
        }));
        Ok(IndicatorScore::new(cat, score, details))
    }
}

/// Persistence of outflows over the recent window plus the slope direction.
fn trend_score(history: &[f64], current: f64) -> f64 {
    if history.len() < MIN_TREND_HISTORY {
        return math::NEUTRAL;
    }
    let mut series: Vec<f64> = history.to_vec();
    series.push(current);
    let start = series.len().saturating_sub(TREND_WINDOW);
    let window = &series[start..];

    let negative_share = window.iter().filter(|v| **v < 0.0).count() as f64 / window.len() as f64;
    let base = 30.0 + 40.0 * negative_share;

    let slope = math::slope(window);
    let adjust = if slope < -STRONG_SLOPE_USD {
        20.0
    } else if slope < 0.0 {
        10.0
    } else if slope > STRONG_SLOPE_USD {
        -20.0
    } else {
        -10.0
    };
    math::clamp_score(base + adjust)
}

/// How large the flow is, relative to supply when known.
pub(crate) fn magnitude_score(total: f64, supply_usd: Option<f64>) -> f64 {
    match supply_usd {
        Some(supply) if supply > 0.0 => {
            let pct = total / supply * 100.0;
            if pct >= 1.0 {
                85.0
            } else if pct >= 0.5 {
                70.0 + (pct - 0.5) * 30.0
            } else if pct >= 0.1 {
                55.0 + (pct - 0.1) * 37.5
            } else {
                50.0 + pct * 50.0
            }
        }
        _ => {
            if total >= 100_000_000.0 {
                85.0
            } else if total >= 50_000_000.0 {
                70.0
            } else if total >= 10_000_000.0 {
                60.0
            } else if total >= 1_000_000.0 {
                55.0
            } else {
                50.0
            }
        }
    }
}

fn interpret(ratio: f64) -> &'static str {
    if ratio <= -0.5 {
        "strong_accumulation"
    } else if ratio <= -0.2 {
        "accumulation"
    } else if ratio >= 0.5 {
        "strong_distribution"
    } else if ratio >= 0.2 {
        "distribution"
    } else {
        "neutral"
    }
}

fn reason(netflow: f64, ratio: f64, total: f64) -> String {
    let mut parts = Vec::new();
    if netflow < 0.0 {
        parts.push(format!("${:.0} leaving exchanges", netflow.abs()));
        if ratio <= -0.5 {
            parts.push("strong accumulation".to_string());
        } else if ratio <= -0.2 {
            parts.push("moderate accumulation".to_string());
        }
    } else if netflow > 0.0 {
        parts.push(format!("${:.0} entering exchanges", netflow));
        if ratio >= 0.5 {
            parts.push("strong distribution".to_string());
        } else if ratio >= 0.2 {
            parts.push("moderate distribution".to_string());
        }
    }
    if total >= 50_000_000.0 {
        parts.push("very high flow volume".to_string());
    } else if total >= 10_000_000.0 {
        parts.push("significant flow volume".to_string());
    }
    if parts.is_empty() {
        "balanced exchange flow".to_string()
    } else {
        parts.join("; ")
    }
}

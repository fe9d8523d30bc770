//! Whale indicator: large transfers against historical whale activity.
//!
//! Sub-scores:
//! - volume: USD moved vs. historical average (log-ratio)
//! - count: number of transfers vs. historical average (log-ratio)
//! - direction: net outflow from exchanges is bullish
//! - recency: fresh transfers weigh more, larger transfers count double

use chrono::{DateTime, Utc};
use pulse_core::Category;
use serde_json::json;
use tracing::debug;

use super::math::{self, round2};
use super::{
    blend, ensure_non_negative, into_details, sub_scores, Indicator, IndicatorError, IndicatorScore,
};
use crate::inputs::{FlowDirection, WhaleInput};

const WEIGHT_VOLUME: f64 = 0.35;
const WEIGHT_COUNT: f64 = 0.25;
const WEIGHT_DIRECTION: f64 = 0.25;
const WEIGHT_RECENCY: f64 = 0.15;

/// Net flow share of total volume needed to call a direction.
const DIRECTION_SHARE: f64 = 0.10;

/// Transfers of this size get full recency weight; weight caps at 2x.
const RECENCY_REFERENCE_USD: f64 = 10_000_000.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct WhaleIndicator;

impl Indicator for WhaleIndicator {
    type Input = WhaleInput;
    const CATEGORY: Category = Category::Whale;

    fn evaluate(
        &self,
        input: &WhaleInput,
        now: DateTime<Utc>,
    ) -> Result<IndicatorScore, IndicatorError> {
        let cat = Self::CATEGORY;
        ensure_non_negative(cat, "historical_avg_volume_usd", input.historical_avg_volume_usd)?;
        ensure_non_negative(cat, "historical_avg_count", input.historical_avg_count)?;
        for tx in &input.transfers {
            ensure_non_negative(cat, "amount_usd", tx.amount_usd)?;
        }

        if input.transfers.is_empty() {
            return Ok(IndicatorScore::neutral(cat, "no whale transactions in window").with(json!({
                "transaction_count": 0,
            })));
        }

        let count = input.transfers.len();
        let total: f64 = input.transfers.iter().map(|t| t.amount_usd).sum();
        let inflow: f64 = flow_sum(input, FlowDirection::Inflow);
        let outflow: f64 = flow_sum(input, FlowDirection::Outflow);
        let net_flow = outflow - inflow;

        let direction = if net_flow > total * DIRECTION_SHARE {
            "accumulation"
        } else if net_flow < -total * DIRECTION_SHARE {
            "distribution"
        } else {
            "neutral"
        };

        let volume_ratio = ratio(total, input.historical_avg_volume_usd);
        let count_ratio = ratio(count as f64, input.historical_avg_count);

        let volume_score = ratio_score(volume_ratio, total > 0.0);
        let count_score = ratio_score(count_ratio, count > 0);
        let direction_score = if total > 0.0 {
            math::clamp_score(50.0 + 30.0 * net_flow / total)
        } else {
            math::NEUTRAL
        };
        let recency_score = recency_score(input, now);

        let parts = [
            ("volume", volume_score, WEIGHT_VOLUME),
            ("count", count_score, WEIGHT_COUNT),
            ("direction", direction_score, WEIGHT_DIRECTION),
            ("recency", recency_score, WEIGHT_RECENCY),
        ];
        let score = blend(&parts);
        let (subs, weights) = sub_scores(&parts);

        debug!(score, count, total, net_flow, direction, "whale indicator evaluated");

        let details = into_details(json!({
            "transaction_count": count,
            "total_volume_usd": total,
            "avg_transaction_usd": total / count as f64,
            "inflow_volume_usd": inflow,
            "outflow_volume_usd": outflow,
            "net_flow_usd": net_flow,
            "net_direction": direction,
            "volume_vs_avg": volume_ratio.map(round2),
            "count_vs_avg": count_ratio.map(round2),
            "sub_scores": subs,
            "weights": weights,
            "reason": reason(direction, volume_ratio, count),
        }));
        Ok(IndicatorScore::new(cat, score, details))
    }
}

fn flow_sum(input: &WhaleInput, direction: FlowDirection) -> f64 {
    input
        .transfers
        .iter()
        .filter(|t| t.direction == direction)
        .map(|t| t.amount_usd)
        .sum()
}

fn ratio(current: f64, historical_avg: f64) -> Option<f64> {
    if historical_avg > 0.0 {
        Some(current / historical_avg)
    } else {
        None
    }
}

/// Log-ratio score; without history any activity is mildly interesting.
fn ratio_score(ratio: Option<f64>, active: bool) -> f64 {
    match ratio {
        Some(r) => math::log_ratio_score(r),
        None if active => 60.0,
        None => math::NEUTRAL,
    }
}

/// Score for a transfer of the given age.
pub(crate) fn age_score(age_hours: f64) -> f64 {
    let h = age_hours.max(0.0);
    if h <= 2.0 {
        100.0 - 10.0 * h
    } else if h <= 6.0 {
        80.0 - 5.0 * (h - 2.0)
    } else if h <= 12.0 {
        60.0 - 3.33 * (h - 6.0)
    } else {
        (40.0 - 1.67 * (h - 12.0)).max(20.0)
    }
}

fn recency_score(input: &WhaleInput, now: DateTime<Utc>) -> f64 {
    let (scores, weights): (Vec<f64>, Vec<f64>) = input
        .transfers
        .iter()
        .filter_map(|t| {
            let ts = t.timestamp?;
            let age_hours = (now - ts).num_seconds() as f64 / 3_600.0;
            let weight = (t.amount_usd / RECENCY_REFERENCE_USD).min(2.0);
            Some((age_score(age_hours), weight))
        })
        .unzip();
    math::weighted_average(&scores, &weights).unwrap_or(math::NEUTRAL)
}

fn reason(direction: &str, volume_ratio: Option<f64>, count: usize) -> String {
    let mut parts = Vec::new();
    match direction {
        "accumulation" => parts.push("whales withdrawing from exchanges".to_string()),
        "distribution" => parts.push("whales sending to exchanges".to_string()),
        _ => {}
    }
    if let Some(r) = volume_ratio {
        if r >= 2.0 {
            parts.push(format!("volume {:.1}x the average", r));
        } else if r <= 0.5 {
            parts.push("volume below average".to_string());
        }
    }
    parts.push(format!("{} large transactions", count));
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::WhaleTransfer;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn tx(amount: f64, direction: FlowDirection, age_h: i64) -> WhaleTransfer {
        WhaleTransfer {
            amount_usd: amount,
            amount_crypto: None,
            direction,
            timestamp: Some(now() - Duration::hours(age_h)),
        }
    }

    #[test]
    fn empty_is_neutral() {
        let s = WhaleIndicator.evaluate(&WhaleInput::default(), now()).unwrap();
        assert_eq!(s.value, 50.0);
        assert!(s.reason().is_some());
    }

    #[test]
    fn bullish_outflows_score_high() {
        let input = WhaleInput {
            transfers: vec![
                tx(10e6, FlowDirection::Outflow, 0),
                tx(3e6, FlowDirection::Outflow, 1),
                tx(2e6, FlowDirection::Outflow, 2),
            ],
            historical_avg_volume_usd: 5e6,
            historical_avg_count: 1.0,
        };
        let s = WhaleIndicator.evaluate(&input, now()).unwrap();
        assert!((s.value - 78.56).abs() < 0.1, "got {}", s.value);
        assert_eq!(s.details["net_direction"], "accumulation");
    }

    #[test]
    fn inflows_push_below_neutral_direction() {
        let input = WhaleInput {
            transfers: vec![tx(8e6, FlowDirection::Inflow, 20), tx(6e6, FlowDirection::Inflow, 30)],
            historical_avg_volume_usd: 28e6,
            historical_avg_count: 4.0,
        };
        let s = WhaleIndicator.evaluate(&input, now()).unwrap();
        assert_eq!(s.details["net_direction"], "distribution");
        assert!(s.value < 40.0, "got {}", s.value);
    }

    #[test]
    fn no_history_uses_activity_fallback() {
        let input = WhaleInput {
            transfers: vec![tx(6e6, FlowDirection::Other, 1)],
            ..Default::default()
        };
        let s = WhaleIndicator.evaluate(&input, now()).unwrap();
        assert_eq!(s.details["sub_scores"]["volume"], 60.0);
        assert_eq!(s.details["sub_scores"]["direction"], 50.0);
    }

    #[test]
    fn missing_timestamps_give_neutral_recency() {
        let mut t = tx(6e6, FlowDirection::Other, 0);
        t.timestamp = None;
        let input = WhaleInput {
            transfers: vec![t],
            ..Default::default()
        };
        let s = WhaleIndicator.evaluate(&input, now()).unwrap();
        assert_eq!(s.details["sub_scores"]["recency"], 50.0);
    }

    #[test]
    fn age_curve() {
        assert_eq!(age_score(0.0), 100.0);
        assert_eq!(age_score(2.0), 80.0);
        assert_eq!(age_score(6.0), 60.0);
        assert!((age_score(12.0) - 40.02).abs() < 1e-9);
        assert_eq!(age_score(100.0), 20.0);
        assert_eq!(age_score(-3.0), 100.0);
    }

    #[test]
    fn negative_amount_is_malformed() {
        let input = WhaleInput {
            transfers: vec![tx(-1.0, FlowDirection::Inflow, 0)],
            ..Default::default()
        };
        assert!(matches!(
            WhaleIndicator.evaluate(&input, now()),
            Err(IndicatorError::MalformedInput { category: Category::Whale, .. })
        ));
    }
}

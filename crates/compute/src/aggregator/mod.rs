//! Composite "explosion" score.
//!
//! The aggregator runs all five indicators for one asset, blends their values
//! by the configured weights and classifies the result. One failing indicator
//! never fails the aggregation: its category reads 50 with an `error` detail
//! and its weight is left out of the normalization.

mod summary;


use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use pulse_core::{Category, Details};
use pulse_rules::config::{IndicatorWeights, StatusThresholds};
use pulse_rules::{ConfigError, ScoringConfigSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::indicators::math;
use crate::indicators::{
    Indicator, IndicatorError, IndicatorScore, NarrativeIndicator, NetflowIndicator,
    OpenInterestIndicator, VolumeIndicator, WhaleIndicator,
};
use crate::inputs::AssetInputs;

pub use summary::{driver_phrase, top_drivers};

/// Status zone of a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreStatus {
    Low,
    Attention,
    High,
}

impl ScoreStatus {
    /// Step function of `value` with breakpoints at the two thresholds.
    pub fn from_value(value: f64, thresholds: &StatusThresholds) -> Self {
        if value >= thresholds.high {
            ScoreStatus::High
        } else if value >= thresholds.attention {
            ScoreStatus::Attention
        } else {
            ScoreStatus::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreStatus::Low => "low",
            ScoreStatus::Attention => "attention",
            ScoreStatus::High => "high",
        }
    }
}

impl std::fmt::Display for ScoreStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One asset's blended score with everything needed to explain it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub asset_symbol: String,
    /// Weight-normalized average of the indicator values, in [0, 100].
    pub value: f64,
    pub status: ScoreStatus,
    pub per_category: BTreeMap<Category, f64>,
    /// Indicator details, or `{"error": ...}` for a failed category.
    pub details: BTreeMap<Category, Details>,
    /// Weights in effect for this computation.
    pub weights: BTreeMap<Category, f64>,
    /// The one or two categories farthest from neutral.
    pub top_drivers: Vec<Category>,
    pub summary: String,
    pub computed_at: DateTime<Utc>,
}

impl CompositeScore {
    /// Categories whose indicator failed and were neutralized.
    pub fn failed_categories(&self) -> Vec<Category> {
        self.details
            .iter()
            .filter(|(_, d)| d.contains_key("error"))
            .map(|(c, _)| *c)
            .collect()
    }
}

/// Runs the indicators and blends their results.
#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator {
    config: ScoringConfigSpec,
}

impl ScoreAggregator {
    pub fn new(config: ScoringConfigSpec) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfigSpec {
        &self.config
    }

    /// Replace the weights. Rejected weights leave the current ones in place.
    pub fn update_weights(&mut self, weights: IndicatorWeights) -> Result<(), ConfigError> {
        let candidate = ScoringConfigSpec {
            weights,
            status_thresholds: self.config.status_thresholds,
        };
        candidate.validate()?;
        info!(weights = ?candidate.weights.as_map(), "indicator weights updated");
        self.config = candidate;
        Ok(())
    }

    /// Score one asset. Missing category inputs evaluate as empty records.
    pub fn aggregate(
        &self,
        asset_symbol: &str,
        inputs: &AssetInputs,
        now: DateTime<Utc>,
    ) -> CompositeScore {
        let mut per_category = BTreeMap::new();
        let mut details = BTreeMap::new();
        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;

        for category in Category::ALL {
            let weight = self.config.weights.get(category);
            match evaluate_category(category, inputs, now) {
                Ok(score) => {
                    weighted_sum += score.value * weight;
                    total_weight += weight;
                    per_category.insert(category, score.value);
                    details.insert(category, score.details);
                }
                Err(e) => {
                    warn!(
                        symbol = %asset_symbol,
                        category = %category,
                        error = %e,
                        "indicator failed, using neutral score"
                    );
                    per_category.insert(category, math::NEUTRAL);
                    details.insert(category, error_details(&e));
                }
            }
        }

        let value = if total_weight > 0.0 {
            math::clamp_score(weighted_sum / total_weight)
        } else {
            math::NEUTRAL
        };
        let status = ScoreStatus::from_value(value, &self.config.status_thresholds);
        let drivers = top_drivers(&per_category);
        let summary = summary::summarize(value, status, &per_category, &drivers);

        info!(symbol = %asset_symbol, score = value, status = %status, "composite score computed");

        CompositeScore {
            asset_symbol: asset_symbol.to_string(),
            value,
            status,
            per_category,
            details,
            weights: self.config.weights.as_map(),
            top_drivers: drivers,
            summary,
            computed_at: now,
        }
    }
}

/// Compile-time dispatch from category to its indicator.
fn evaluate_category(
    category: Category,
    inputs: &AssetInputs,
    now: DateTime<Utc>,
) -> Result<IndicatorScore, IndicatorError> {
    match category {
        Category::Whale => evaluate_or_empty(&WhaleIndicator, inputs.whale.as_ref(), now),
        Category::Volume => evaluate_or_empty(&VolumeIndicator, inputs.volume.as_ref(), now),
        Category::Netflow => evaluate_or_empty(&NetflowIndicator, inputs.netflow.as_ref(), now),
        Category::OpenInterest => {
            evaluate_or_empty(&OpenInterestIndicator, inputs.open_interest.as_ref(), now)
        }
        Category::Narrative => {
            evaluate_or_empty(&NarrativeIndicator, inputs.narrative.as_ref(), now)
        }
    }
}

fn evaluate_or_empty<I>(
    indicator: &I,
    input: Option<&I::Input>,
    now: DateTime<Utc>,
) -> Result<IndicatorScore, IndicatorError>
where
    I: Indicator,
    I::Input: Default,
{
    match input {
        Some(input) => indicator.evaluate(input, now),
        None => indicator.evaluate(&I::Input::default(), now),
    }
}

fn error_details(err: &IndicatorError) -> Details {
    let mut d = Details::new();
    d.insert("error".to_string(), Value::String(err.to_string()));
    d
}

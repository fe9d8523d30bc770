//! The five indicators and their shared contract.
//!
//! Each indicator maps one category's input record to a score in [0, 100]
//! plus a structured details map. Empty or insufficient input scores the
//! neutral 50 with a `reason`; only malformed input (non-finite or negative
//! amounts) is an error.

pub mod math;
mod narrative;
mod netflow;
mod open_interest;
mod volume;
mod whale;

use chrono::{DateTime, Utc};
use pulse_core::{Category, Details};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub use narrative::NarrativeIndicator;
pub use netflow::NetflowIndicator;
pub use open_interest::OpenInterestIndicator;
pub use volume::VolumeIndicator;
pub use whale::WhaleIndicator;

/// Output of one indicator evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorScore {
    pub category: Category,
    /// Always within [0, 100].
    pub value: f64,
    pub details: Details,
}

impl IndicatorScore {
    /// Build a score, clamping `value` into range.
    pub fn new(category: Category, value: f64, details: Details) -> Self {
        Self {
            category,
            value: math::clamp_score(value),
            details,
        }
    }

    /// The neutral 50 with an explanatory `reason`.
    pub fn neutral(category: Category, reason: impl Into<String>) -> Self {
        let mut details = Details::new();
        details.insert("reason".to_string(), Value::String(reason.into()));
        Self {
            category,
            value: math::NEUTRAL,
            details,
        }
    }

    /// Merge extra fields into the neutral details.
    pub(crate) fn with(mut self, extra: Value) -> Self {
        if let Value::Object(map) = extra {
            self.details.extend(map);
        }
        self
    }

    pub fn reason(&self) -> Option<&str> {
        self.details.get("reason").and_then(|v| v.as_str())
    }
}

/// Raised only for input that cannot be scored at all.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndicatorError {
    #[error("malformed {category} input: {reason}")]
    MalformedInput { category: Category, reason: String },
}

/// A signal-to-score transformer for one category.
pub trait Indicator {
    type Input;
    const CATEGORY: Category;

    /// Score `input` as of `now` (used for recency weighting).
    fn evaluate(
        &self,
        input: &Self::Input,
        now: DateTime<Utc>,
    ) -> Result<IndicatorScore, IndicatorError>;
}

// ── Input validation helpers ────────────────────────────────────────

pub(crate) fn malformed(category: Category, reason: impl Into<String>) -> IndicatorError {
    IndicatorError::MalformedInput {
        category,
        reason: reason.into(),
    }
}

pub(crate) fn ensure_finite(category: Category, field: &str, v: f64) -> Result<(), IndicatorError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(malformed(category, format!("{} is not a finite number ({})", field, v)))
    }
}

pub(crate) fn ensure_non_negative(
    category: Category,
    field: &str,
    v: f64,
) -> Result<(), IndicatorError> {
    ensure_finite(category, field, v)?;
    if v < 0.0 {
        return Err(malformed(category, format!("{} must not be negative ({})", field, v)));
    }
    Ok(())
}

pub(crate) fn into_details(value: Value) -> Details {
    match value {
        Value::Object(map) => map,
        other => {
            let mut m = Details::new();
            m.insert("value".to_string(), other);
            m
        }
    }
}

/// Sub-score/sub-weight pairs rendered into the details map.
pub(crate) fn sub_scores(pairs: &[(&str, f64, f64)]) -> (Value, Value) {
    let mut scores = Details::new();
    let mut weights = Details::new();
    for (name, score, weight) in pairs {
        scores.insert(name.to_string(), json!(math::round2(*score)));
        weights.insert(name.to_string(), json!(weight));
    }
    (Value::Object(scores), Value::Object(weights))
}

/// Blend sub-scores by their weights and clamp.
pub(crate) fn blend(pairs: &[(&str, f64, f64)]) -> f64 {
    math::clamp_score(pairs.iter().map(|(_, s, w)| s * w).sum())
}

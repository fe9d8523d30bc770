//! ScoringConfig document kind: indicator weights and status thresholds
//! for the composite score.

use std::collections::BTreeMap;

use pulse_core::Category;
use serde::{Deserialize, Serialize};

use crate::schema::CommonMetadata;

use super::error::{ConfigError, Result};

// ── YAML-level types ────────────────────────────────────────────────

/// Top-level ScoringConfig document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfigRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub spec: ScoringConfigSpec,
}

/// Specification section of a ScoringConfig document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfigSpec {
    /// Relative weight of each indicator. Need not sum to 1.
    #[serde(default)]
    pub weights: IndicatorWeights,
    /// Breakpoints between Low, Attention and High.
    #[serde(default)]
    pub status_thresholds: StatusThresholds,
}

/// Per-category weights.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IndicatorWeights {
    pub whale: f64,
    pub volume: f64,
    pub netflow: f64,
    pub open_interest: f64,
    pub narrative: f64,
}

impl Default for IndicatorWeights {
    fn default() -> Self {
        Self {
            whale: 0.25,
            volume: 0.20,
            netflow: 0.25,
            open_interest: 0.15,
            narrative: 0.15,
        }
    }
}

impl IndicatorWeights {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::Whale => self.whale,
            Category::Volume => self.volume,
            Category::Netflow => self.netflow,
            Category::OpenInterest => self.open_interest,
            Category::Narrative => self.narrative,
        }
    }

    pub fn set(&mut self, category: Category, weight: f64) {
        match category {
            Category::Whale => self.whale = weight,
            Category::Volume => self.volume = weight,
            Category::Netflow => self.netflow = weight,
            Category::OpenInterest => self.open_interest = weight,
            Category::Narrative => self.narrative = weight,
        }
    }

    pub fn total(&self) -> f64 {
        Category::ALL.iter().map(|c| self.get(*c)).sum()
    }

    pub fn as_map(&self) -> BTreeMap<Category, f64> {
        Category::ALL.iter().map(|c| (*c, self.get(*c))).collect()
    }
}

/// Status breakpoints on the 0–100 composite scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StatusThresholds {
    pub attention: f64,
    pub high: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            attention: 40.0,
            high: 70.0,
        }
    }
}

impl Default for ScoringConfigSpec {
    fn default() -> Self {
        Self {
            weights: IndicatorWeights::default(),
            status_thresholds: StatusThresholds::default(),
        }
    }
}

impl ScoringConfigSpec {
    /// Reject weights and thresholds the aggregator cannot use.
    pub fn validate(&self) -> Result<()> {
        for cat in Category::ALL {
            let w = self.weights.get(cat);
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "weight for '{}' must be a finite non-negative number, got {}",
                    cat, w
                )));
            }
        }
        if self.weights.total() <= 0.0 {
            return Err(ConfigError::Validation(
                "at least one indicator weight must be positive".to_string(),
            ));
        }

        let t = &self.status_thresholds;
        let in_range = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        if !in_range(t.attention) || !in_range(t.high) {
            return Err(ConfigError::Validation(
                "status thresholds must lie in [0, 100]".to_string(),
            ));
        }
        if t.attention > t.high {
            return Err(ConfigError::Validation(format!(
                "attention threshold ({}) must not exceed high threshold ({})",
                t.attention, t.high
            )));
        }
        Ok(())
    }
}

impl ScoringConfigRule {
    /// Validate and return the typed spec.
    pub fn compile(&self) -> Result<ScoringConfigSpec> {
        self.spec.validate()?;
        Ok(self.spec.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scoring_config_yaml() {
        let yaml = include_str!("../../../../data/rules/scoring-config.yml");
        let rule: ScoringConfigRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rule.kind, "ScoringConfig");
        let spec = rule.compile().unwrap();
        assert_eq!(spec, ScoringConfigSpec::default());
    }

    #[test]
    fn defaults_sum_to_one() {
        let w = IndicatorWeights::default();
        assert!((w.total() - 1.0).abs() < 1e-10);
        assert_eq!(w.get(Category::Whale), 0.25);
        assert_eq!(w.get(Category::Narrative), 0.15);
    }

    #[test]
    fn partial_spec_uses_defaults() {
        let yaml = r#"
apiVersion: v1
kind: ScoringConfig
metadata:
  id: scoring-thresholds-only
  name: Thresholds only
spec:
  status_thresholds:
    attention: 35
    high: 65
"#;
        let rule: ScoringConfigRule = serde_yaml::from_str(yaml).unwrap();
        let spec = rule.compile().unwrap();
        assert_eq!(spec.weights, IndicatorWeights::default());
        assert_eq!(spec.status_thresholds.high, 65.0);
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let mut spec = ScoringConfigSpec::default();
        spec.status_thresholds.attention = 80.0;
        assert!(matches!(spec.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn rejects_negative_and_all_zero_weights() {
        let mut spec = ScoringConfigSpec::default();
        spec.weights.set(Category::Volume, -0.1);
        assert!(spec.validate().is_err());

        let mut spec = ScoringConfigSpec::default();
        for cat in Category::ALL {
            spec.weights.set(cat, 0.0);
        }
        assert!(spec.validate().is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let yaml = r#"
apiVersion: v1
kind: ScoringConfig
metadata:
  id: bad
  name: Bad
spec:
  weights:
    whale: 1.0
    volume: 0.0
    netflow: 0.0
    open_interest: 0.0
    narrative: 0.0
    sentiment: 0.3
"#;
        assert!(serde_yaml::from_str::<ScoringConfigRule>(yaml).is_err());
    }
}

//! ThresholdConfig document kind: trigger levels, cooldown overrides and
//! disabled alert kinds for the threshold monitor.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::alerts::AlertKind;
use crate::cooldown::parse_cooldown;
use crate::schema::CommonMetadata;
use crate::templates::AlertTemplate;

use super::error::{ConfigError, Result};

/// Longest cooldown override a document may set.
const MAX_COOLDOWN: Duration = Duration::from_secs(365 * 24 * 3_600);

// ── YAML-level types ────────────────────────────────────────────────

/// Top-level ThresholdConfig document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ThresholdConfigRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub spec: ThresholdConfigSpec,
}

/// Specification section of a ThresholdConfig document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ThresholdConfigSpec {
    #[serde(default)]
    pub score: ScoreThresholds,
    #[serde(default)]
    pub whale: WhaleThresholds,
    #[serde(default)]
    pub price: PriceThresholds,
    #[serde(default)]
    pub volume: VolumeThresholds,
    #[serde(default)]
    pub system: SystemThresholds,
    /// Per-kind cooldown overrides, e.g. `score_high: 90m`.
    #[serde(default)]
    pub cooldowns: BTreeMap<AlertKind, String>,
    /// Kinds the monitor never emits.
    #[serde(default)]
    pub disabled: Vec<AlertKind>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoreThresholds {
    pub critical: f64,
    pub high: f64,
    /// Minimum rise between two checks that counts as a spike.
    pub spike_delta: f64,
    /// Maximum (negative) change that counts as a drop.
    pub drop_delta: f64,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            critical: 85.0,
            high: 70.0,
            spike_delta: 15.0,
            drop_delta: -15.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WhaleThresholds {
    /// Single transfers below this USD value are ignored.
    pub min_usd: f64,
    /// Total windowed volume needed for an accumulation/distribution alert.
    pub pattern_min_usd: f64,
}

impl Default for WhaleThresholds {
    fn default() -> Self {
        Self {
            min_usd: 5_000_000.0,
            pattern_min_usd: 10_000_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PriceThresholds {
    pub surge_percent: f64,
    pub dump_percent: f64,
}

impl Default for PriceThresholds {
    fn default() -> Self {
        Self {
            surge_percent: 10.0,
            dump_percent: -10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct VolumeThresholds {
    pub spike_multiplier: f64,
}

impl Default for VolumeThresholds {
    fn default() -> Self {
        Self {
            spike_multiplier: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SystemThresholds {
    /// Collector lag, in minutes, that raises a data-delay alert.
    pub data_delay_minutes: f64,
}

impl Default for SystemThresholds {
    fn default() -> Self {
        Self {
            data_delay_minutes: 30.0,
        }
    }
}

impl Default for ThresholdConfigSpec {
    fn default() -> Self {
        Self {
            score: ScoreThresholds::default(),
            whale: WhaleThresholds::default(),
            price: PriceThresholds::default(),
            volume: VolumeThresholds::default(),
            system: SystemThresholds::default(),
            cooldowns: BTreeMap::new(),
            disabled: Vec::new(),
        }
    }
}

// ── Compiled (hot-path) type ────────────────────────────────────────

/// Validated thresholds with cooldown strings parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledThresholds {
    pub score: ScoreThresholds,
    pub whale: WhaleThresholds,
    pub price: PriceThresholds,
    pub volume: VolumeThresholds,
    pub system: SystemThresholds,
    cooldown_overrides: HashMap<AlertKind, Duration>,
    disabled: HashSet<AlertKind>,
}

impl CompiledThresholds {
    /// Cooldown for `kind`: the override if configured, else the template's.
    pub fn cooldown(&self, kind: AlertKind) -> Duration {
        self.cooldown_overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| AlertTemplate::for_kind(kind).cooldown)
    }

    pub fn is_enabled(&self, kind: AlertKind) -> bool {
        !self.disabled.contains(&kind)
    }
}

impl Default for CompiledThresholds {
    fn default() -> Self {
        let spec = ThresholdConfigSpec::default();
        Self {
            score: spec.score,
            whale: spec.whale,
            price: spec.price,
            volume: spec.volume,
            system: spec.system,
            cooldown_overrides: HashMap::new(),
            disabled: HashSet::new(),
        }
    }
}

impl ThresholdConfigSpec {
    /// Validate ordering constraints and parse cooldown overrides.
    pub fn compile(&self) -> Result<CompiledThresholds> {
        let s = &self.score;
        let all_finite = [
            s.critical,
            s.high,
            s.spike_delta,
            s.drop_delta,
            self.whale.min_usd,
            self.whale.pattern_min_usd,
            self.price.surge_percent,
            self.price.dump_percent,
            self.volume.spike_multiplier,
            self.system.data_delay_minutes,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !all_finite {
            return Err(ConfigError::Validation(
                "thresholds must be finite numbers".to_string(),
            ));
        }
        if s.high > s.critical {
            return Err(ConfigError::Validation(format!(
                "score.high ({}) must not exceed score.critical ({})",
                s.high, s.critical
            )));
        }
        if !(s.drop_delta < 0.0 && s.spike_delta > 0.0) {
            return Err(ConfigError::Validation(
                "score.drop_delta must be negative and score.spike_delta positive".to_string(),
            ));
        }
        if !(self.price.dump_percent < 0.0 && self.price.surge_percent > 0.0) {
            return Err(ConfigError::Validation(
                "price.dump_percent must be negative and price.surge_percent positive".to_string(),
            ));
        }
        if self.volume.spike_multiplier <= 0.0 {
            return Err(ConfigError::Validation(
                "volume.spike_multiplier must be positive".to_string(),
            ));
        }
        if self.whale.min_usd < 0.0 || self.whale.pattern_min_usd < 0.0 {
            return Err(ConfigError::Validation(
                "whale thresholds must not be negative".to_string(),
            ));
        }

        let mut cooldown_overrides = HashMap::with_capacity(self.cooldowns.len());
        for (kind, raw) in &self.cooldowns {
            let d = parse_cooldown(raw).ok_or_else(|| {
                ConfigError::Validation(format!("invalid cooldown '{}' for {}", raw, kind))
            })?;
            if d > MAX_COOLDOWN {
                return Err(ConfigError::Validation(format!(
                    "cooldown '{}' for {} exceeds 365d",
                    raw, kind
                )));
            }
            cooldown_overrides.insert(*kind, d);
        }

        Ok(CompiledThresholds {
            score: self.score,
            whale: self.whale,
            price: self.price,
            volume: self.volume,
            system: self.system,
            cooldown_overrides,
            disabled: self.disabled.iter().copied().collect(),
        })
    }
}

impl ThresholdConfigRule {
    pub fn compile(&self) -> Result<CompiledThresholds> {
        self.spec.compile()
    }
}

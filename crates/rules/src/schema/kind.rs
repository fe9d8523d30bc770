//! Document kind enum for two-pass deserialization dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported engine document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigKind {
    ScoringConfig,
    ThresholdConfig,
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKind::ScoringConfig => write!(f, "ScoringConfig"),
            ConfigKind::ThresholdConfig => write!(f, "ThresholdConfig"),
        }
    }
}

impl FromStr for ConfigKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ScoringConfig" => Ok(ConfigKind::ScoringConfig),
            "ThresholdConfig" => Ok(ConfigKind::ThresholdConfig),
            other => Err(format!("unknown document kind: '{}'", other)),
        }
    }
}

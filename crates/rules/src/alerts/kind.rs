//! Alert kinds and severities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Every notification the monitor can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    ScoreHigh,
    ScoreCritical,
    ScoreSpike,
    ScoreDrop,
    WhaleLargeTx,
    WhaleAccumulation,
    WhaleDistribution,
    PriceSurge,
    PriceDump,
    VolumeSpike,
    SystemError,
    SystemDataDelay,
}

impl AlertKind {
    pub const ALL: [AlertKind; 12] = [
        AlertKind::ScoreHigh,
        AlertKind::ScoreCritical,
        AlertKind::ScoreSpike,
        AlertKind::ScoreDrop,
        AlertKind::WhaleLargeTx,
        AlertKind::WhaleAccumulation,
        AlertKind::WhaleDistribution,
        AlertKind::PriceSurge,
        AlertKind::PriceDump,
        AlertKind::VolumeSpike,
        AlertKind::SystemError,
        AlertKind::SystemDataDelay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::ScoreHigh => "score_high",
            AlertKind::ScoreCritical => "score_critical",
            AlertKind::ScoreSpike => "score_spike",
            AlertKind::ScoreDrop => "score_drop",
            AlertKind::WhaleLargeTx => "whale_large_tx",
            AlertKind::WhaleAccumulation => "whale_accumulation",
            AlertKind::WhaleDistribution => "whale_distribution",
            AlertKind::PriceSurge => "price_surge",
            AlertKind::PriceDump => "price_dump",
            AlertKind::VolumeSpike => "volume_spike",
            AlertKind::SystemError => "system_error",
            AlertKind::SystemDataDelay => "system_data_delay",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlertKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown alert kind: '{}'", s))
    }
}

/// Alert severity, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    /// Numeric priority, 1 (info) through 5 (critical).
    pub fn priority(&self) -> u8 {
        match self {
            AlertSeverity::Info => 1,
            AlertSeverity::Low => 2,
            AlertSeverity::Medium => 3,
            AlertSeverity::High => 4,
            AlertSeverity::Critical => 5,
        }
    }

    /// Hex color used by dashboards.
    pub fn color(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "#3B82F6",
            AlertSeverity::Low => "#10B981",
            AlertSeverity::Medium => "#F59E0B",
            AlertSeverity::High => "#F97316",
            AlertSeverity::Critical => "#EF4444",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_str_round_trip() {
        for kind in AlertKind::ALL {
            assert_eq!(kind.as_str().parse::<AlertKind>().unwrap(), kind);
        }
        assert!("score_explosion".parse::<AlertKind>().is_err());
    }

    #[test]
    fn kind_serde_matches_as_str() {
        let json = serde_json::to_string(&AlertKind::WhaleLargeTx).unwrap();
        assert_eq!(json, "\"whale_large_tx\"");
    }

    #[test]
    fn severity_order_follows_priority() {
        assert!(AlertSeverity::Critical > AlertSeverity::High);
        assert!(AlertSeverity::Low > AlertSeverity::Info);
        assert_eq!(AlertSeverity::Info.priority(), 1);
        assert_eq!(AlertSeverity::Critical.priority(), 5);
        assert_eq!(AlertSeverity::Medium.color(), "#F59E0B");
    }
}

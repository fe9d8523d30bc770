//! The five signal categories scored for every asset.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PulseError;

/// Free-form structured details attached to scores and alerts.
pub type Details = serde_json::Map<String, serde_json::Value>;

/// One of the independent signal families that feed the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Whale,
    Volume,
    Netflow,
    OpenInterest,
    Narrative,
}

impl Category {
    /// All categories in aggregation order.
    pub const ALL: [Category; 5] = [
        Category::Whale,
        Category::Volume,
        Category::Netflow,
        Category::OpenInterest,
        Category::Narrative,
    ];

    /// Stable snake_case key used in maps and serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Whale => "whale",
            Category::Volume => "volume",
            Category::Netflow => "netflow",
            Category::OpenInterest => "open_interest",
            Category::Narrative => "narrative",
        }
    }

    /// Human-readable name for summaries and alert messages.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Whale => "Whale Activity",
            Category::Volume => "Volume",
            Category::Netflow => "Exchange Netflow",
            Category::OpenInterest => "Open Interest",
            Category::Narrative => "Narrative",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = PulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "whale" => Ok(Category::Whale),
            "volume" => Ok(Category::Volume),
            "netflow" => Ok(Category::Netflow),
            "open_interest" | "oi" => Ok(Category::OpenInterest),
            "narrative" => Ok(Category::Narrative),
            other => Err(PulseError::UnknownCategory(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for cat in Category::ALL {
            assert_eq!(cat.as_str().parse::<Category>().unwrap(), cat);
        }
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Category::OpenInterest).unwrap();
        assert_eq!(json, "\"open_interest\"");
        let back: Category = serde_json::from_str("\"whale\"").unwrap();
        assert_eq!(back, Category::Whale);
    }

    #[test]
    fn unknown_category_is_an_error() {
        assert!(matches!(
            "sentiment".parse::<Category>(),
            Err(PulseError::UnknownCategory(_))
        ));
    }
}

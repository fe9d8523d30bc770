//! Human-readable composite summaries.

use std::collections::BTreeMap;

use pulse_core::Category;

use super::ScoreStatus;

const MAX_DRIVERS: usize = 2;
const BULLISH_AT: f64 = 60.0;
const BEARISH_AT: f64 = 40.0;

/// The (at most two) categories farthest from neutral, most extreme first.
///
/// Categories sitting exactly at 50 never drive. Ties keep category order.
pub fn top_drivers(per_category: &BTreeMap<Category, f64>) -> Vec<Category> {
    let mut ranked: Vec<(Category, f64)> = per_category
        .iter()
        .map(|(c, v)| (*c, (v - 50.0).abs()))
        .filter(|(_, distance)| *distance > 0.0)
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().take(MAX_DRIVERS).map(|(c, _)| c).collect()
}

/// Short phrase describing what a category's score says, or `None` near neutral.
pub fn driver_phrase(category: Category, value: f64) -> Option<&'static str> {
    let bullish = value >= BULLISH_AT;
    let bearish = value <= BEARISH_AT;
    if !bullish && !bearish {
        return None;
    }
    let phrase = match (category, bullish) {
        (Category::Whale, true) => "Whales accumulating",
        (Category::Whale, false) => "Whales distributing",
        (Category::Volume, true) => "Volume surging",
        (Category::Volume, false) => "Volume drying up",
        (Category::Netflow, true) => "Netflow outflow (bullish)",
        (Category::Netflow, false) => "Netflow inflow (bearish)",
        (Category::OpenInterest, true) => "Derivatives positioning bullish",
        (Category::OpenInterest, false) => "Derivatives positioning bearish",
        (Category::Narrative, true) => "Narrative momentum positive",
        (Category::Narrative, false) => "Narrative turning negative",
    };
    Some(phrase)
}

pub(super) fn summarize(
    value: f64,
    status: ScoreStatus,
    per_category: &BTreeMap<Category, f64>,
    drivers: &[Category],
) -> String {
    let zone = match status {
        ScoreStatus::High => "explosion zone",
        ScoreStatus::Attention => "attention zone",
        ScoreStatus::Low => "normal zone",
    };
    let mut parts = vec![format!("Score {:.0} in {}", value, zone)];

    if drivers.is_empty() {
        parts.push("no dominant drivers".to_string());
    } else {
        let names: Vec<String> = drivers
            .iter()
            .map(|c| format!("{} {:.0}", c.label(), per_category.get(c).copied().unwrap_or(50.0)))
            .collect();
        parts.push(format!("Top drivers: {}", names.join(", ")));
    }

    let mut ranked: Vec<(Category, f64)> = per_category.iter().map(|(c, v)| (*c, *v)).collect();
    ranked.sort_by(|a, b| (b.1 - 50.0).abs().total_cmp(&(a.1 - 50.0).abs()));

    let positive: Vec<&str> = ranked
        .iter()
        .filter(|(_, v)| *v >= BULLISH_AT)
        .filter_map(|(c, v)| driver_phrase(*c, *v))
        .take(MAX_DRIVERS)
        .collect();
    let negative: Vec<&str> = ranked
        .iter()
        .filter(|(_, v)| *v <= BEARISH_AT)
        .filter_map(|(c, v)| driver_phrase(*c, *v))
        .take(MAX_DRIVERS)
        .collect();

    if !positive.is_empty() {
        parts.push(format!("Positive: {}", positive.join(", ")));
    }
    if !negative.is_empty() {
        parts.push(format!("Negative: {}", negative.join(", ")));
    }
    parts.join(" | ")
}

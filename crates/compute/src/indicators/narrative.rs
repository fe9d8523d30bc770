//! Narrative indicator: news sentiment, mention volume, news recency and
//! classified event impact.

use chrono::{DateTime, Utc};
use pulse_core::Category;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use super::math::{self, round2};
use super::{
    blend, ensure_finite, ensure_non_negative, into_details, sub_scores, Indicator, IndicatorError,
    IndicatorScore,
};
use crate::inputs::{NarrativeInput, NewsItem};

const WEIGHT_SENTIMENT: f64 = 0.40;
const WEIGHT_MENTIONS: f64 = 0.25;
const WEIGHT_RECENCY: f64 = 0.20;
const WEIGHT_IMPACT: f64 = 0.15;

const SENTIMENT_DECAY: f64 = 0.85;
const MAX_SIGNIFICANT_EVENTS: usize = 5;
const MAX_TITLE_CHARS: usize = 100;

const BULLISH_KEYWORDS: &[&str] = &[
    "listing",
    "partnership",
    "adoption",
    "upgrade",
    "etf",
    "approved",
];
const BEARISH_KEYWORDS: &[&str] = &["hack", "exploit", "lawsuit", "ban", "delisting", "scam"];

/// Impact score of a known event type; `None` for unknown types.
pub fn event_impact(event_type: &str) -> Option<f64> {
    let impact = match event_type {
        "listing" => 80.0,
        "partnership" => 75.0,
        "upgrade" | "adoption" => 70.0,
        "etf" => 85.0,
        "regulation_positive" => 65.0,
        "regulation_negative" => 25.0,
        "hack" => 15.0,
        "exploit" => 20.0,
        "lawsuit" => 25.0,
        "delisting" => 20.0,
        "bullish" => 70.0,
        "bearish" => 30.0,
        "neutral" => 50.0,
        _ => return None,
    };
    Some(impact)
}

/// An event or keyword hit that moved the impact sub-score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignificantEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub title: String,
    pub impact: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NarrativeIndicator;

impl Indicator for NarrativeIndicator {
    type Input = NarrativeInput;
    const CATEGORY: Category = Category::Narrative;

    fn evaluate(
        &self,
        input: &NarrativeInput,
        now: DateTime<Utc>,
    ) -> Result<IndicatorScore, IndicatorError> {
        let cat = Self::CATEGORY;
        ensure_non_negative(cat, "historical_mention_avg", input.historical_mention_avg)?;
        for s in &input.sentiment_scores {
            ensure_finite(cat, "sentiment_scores", *s)?;
        }

        if input.news.is_empty() && input.events.is_empty() && input.sentiment_scores.is_empty() {
            return Ok(IndicatorScore::neutral(cat, "no narrative data available").with(json!({
                "news_count": 0,
                "significant_events": [],
            })));
        }

        let sentiments = sentiment_series(input);
        let sentiment_part = sentiment_score(&sentiments);
        let mention_part = mention_score(input.mention_count, input.historical_mention_avg);
        let recency_part = recency_score(&input.news, now);
        let (impact_part, significant) = impact_score(input);

        let parts = [
            ("sentiment", sentiment_part, WEIGHT_SENTIMENT),
            ("mentions", mention_part, WEIGHT_MENTIONS),
            ("recency", recency_part, WEIGHT_RECENCY),
            ("impact", impact_part, WEIGHT_IMPACT),
        ];
        let score = blend(&parts);
        let (subs, weights) = sub_scores(&parts);

        let avg_sentiment = if sentiments.is_empty() {
            None
        } else {
            Some(math::mean(&sentiments))
        };
        let mention_ratio = if input.historical_mention_avg > 0.0 {
            Some(round2(input.mention_count as f64 / input.historical_mention_avg))
        } else {
            None
        };

        debug!(
            score,
            news = input.news.len(),
            events = input.events.len(),
            "narrative indicator evaluated"
        );

        let top: Vec<&SignificantEvent> = significant.iter().take(MAX_SIGNIFICANT_EVENTS).collect();
        let details = into_details(json!({
            "news_count": input.news.len(),
            "avg_sentiment": avg_sentiment.map(round2),
            "overall_sentiment": classify_sentiment(avg_sentiment),
            "mention_count": input.mention_count,
            "mention_ratio": mention_ratio,
            "significant_events": top,
            "sub_scores": subs,
            "weights": weights,
            "reason": reason(avg_sentiment, input.mention_count, &significant),
        }));
        Ok(IndicatorScore::new(cat, score, details))
    }
}

/// Model scores when present, otherwise news labels.
fn sentiment_series(input: &NarrativeInput) -> Vec<f64> {
    if !input.sentiment_scores.is_empty() {
        input.sentiment_scores.iter().map(|s| s.clamp(-1.0, 1.0)).collect()
    } else {
        input.news.iter().map(|n| n.sentiment.value()).collect()
    }
}

/// Decay-weighted sentiment mapped from [-1, 1] to [15, 85].
fn sentiment_score(sentiments: &[f64]) -> f64 {
    let weights = math::decay_weights(sentiments.len(), SENTIMENT_DECAY);
    match math::weighted_average(sentiments, &weights) {
        Some(avg) => math::clamp_score(50.0 + avg * 35.0),
        None => math::NEUTRAL,
    }
}

pub(crate) fn mention_score(mentions: u64, historical_avg: f64) -> f64 {
    if historical_avg <= 0.0 {
        return if mentions > 0 { 60.0 } else { math::NEUTRAL };
    }
    let r = mentions as f64 / historical_avg;
    if r >= 3.0 {
        90.0
    } else if r >= 2.0 {
        75.0 + (r - 2.0) * 15.0
    } else if r >= 1.5 {
        65.0 + (r - 1.5) * 20.0
    } else if r >= 1.0 {
        50.0 + (r - 1.0) * 30.0
    } else if r >= 0.5 {
        35.0 + (r - 0.5) * 30.0
    } else {
        (r * 70.0).max(20.0)
    }
}

fn recency_score(news: &[NewsItem], now: DateTime<Utc>) -> f64 {
    let scores: Vec<f64> = news
        .iter()
        .filter_map(|n| n.published_at)
        .map(|ts| {
            let h = (now - ts).num_seconds() as f64 / 3_600.0;
            if h <= 1.0 {
                95.0
            } else if h <= 4.0 {
                80.0
            } else if h <= 12.0 {
                65.0
            } else if h <= 24.0 {
                50.0
            } else {
                (50.0 - (h - 24.0) / 2.0).max(30.0)
            }
        })
        .collect();
    if scores.is_empty() {
        math::NEUTRAL
    } else {
        math::mean(&scores)
    }
}

/// Whole-word keyword match. Plural and past-tense forms count, so
/// "hacked" hits "hack" but "delisting" does not hit "listing".
fn contains_keyword(tokens: &[String], keyword: &str) -> bool {
    tokens.iter().any(|t| {
        t == keyword
            || t.strip_prefix(keyword).is_some_and(|rest| {
                rest == "s" || rest == "ed" || (rest == "d" && keyword.ends_with('e'))
            })
    })
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn truncate_title(title: &str) -> String {
    title.chars().take(MAX_TITLE_CHARS).collect()
}

/// Impact-weighted average of classified events and keyword hits in news,
/// with the hits ordered most impactful first.
fn impact_score(input: &NarrativeInput) -> (f64, Vec<SignificantEvent>) {
    let mut significant = Vec::new();

    for event in &input.events {
        let event_type = event.event_type.to_lowercase();
        let impact = event_impact(&event_type).unwrap_or(math::NEUTRAL);
        significant.push(SignificantEvent {
            event_type,
            title: truncate_title(&event.title),
            impact,
        });
    }

    for item in &input.news {
        let tokens = tokenize(&format!("{} {}", item.title, item.summary));
        let groups = [(BULLISH_KEYWORDS, 70.0), (BEARISH_KEYWORDS, 30.0)];
        for (keywords, fallback) in groups {
            if let Some(kw) = keywords.iter().find(|kw| contains_keyword(&tokens, kw)) {
                significant.push(SignificantEvent {
                    event_type: kw.to_string(),
                    title: truncate_title(&item.title),
                    impact: event_impact(kw).unwrap_or(fallback),
                });
            }
        }
    }

    if significant.is_empty() {
        return (math::NEUTRAL, significant);
    }

    significant.sort_by(|a, b| (b.impact - 50.0).abs().total_cmp(&(a.impact - 50.0).abs()));
    let scores: Vec<f64> = significant.iter().map(|e| e.impact).collect();
    let weights: Vec<f64> = significant.iter().map(|e| (e.impact - 50.0).abs() + 10.0).collect();
    let score = math::weighted_average(&scores, &weights).unwrap_or(math::NEUTRAL);
    (score, significant)
}

fn classify_sentiment(avg: Option<f64>) -> &'static str {
    match avg {
        None => "unknown",
        Some(s) if s >= 0.5 => "very_bullish",
        Some(s) if s >= 0.2 => "bullish",
        Some(s) if s <= -0.5 => "very_bearish",
        Some(s) if s <= -0.2 => "bearish",
        Some(_) => "neutral",
    }
}

fn reason(sentiment: Option<f64>, mentions: u64, events: &[SignificantEvent]) -> String {
    let mut parts = Vec::new();
    match sentiment {
        Some(s) if s >= 0.5 => parts.push("very positive sentiment".to_string()),
        Some(s) if s >= 0.2 => parts.push("positive sentiment".to_string()),
        Some(s) if s <= -0.5 => parts.push("very negative sentiment".to_string()),
        Some(s) if s <= -0.2 => parts.push("negative sentiment".to_string()),
        _ => {}
    }
    if mentions > 0 {
        parts.push(format!("{} recent mentions", mentions));
    }
    let positive = events.iter().filter(|e| e.impact > 60.0).count();
    let negative = events.iter().filter(|e| e.impact < 40.0).count();
    if positive > 0 {
        parts.push(format!("{} positive event(s)", positive));
    }
    if negative > 0 {
        parts.push(format!("{} negative event(s)", negative));
    }
    if parts.is_empty() {
        "neutral narrative".to_string()
    } else {
        parts.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::{NarrativeEvent, SentimentLabel};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn news(title: &str, sentiment: SentimentLabel, age_h: i64) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            summary: String::new(),
            sentiment,
            published_at: Some(now() - Duration::hours(age_h)),
        }
    }

    #[test]
    fn no_data_is_neutral() {
        let s = NarrativeIndicator.evaluate(&NarrativeInput::default(), now()).unwrap();
        assert_eq!(s.value, 50.0);
        assert_eq!(s.reason(), Some("no narrative data available"));
    }

    #[test]
    fn fresh_bullish_listing() {
        let input = NarrativeInput {
            news: vec![news("Major exchange announces listing", SentimentLabel::Bullish, 0)],
            ..Default::default()
        };
        let s = NarrativeIndicator.evaluate(&input, now()).unwrap();
        assert!((s.value - 73.3).abs() < 0.01, "got {}", s.value);
        assert_eq!(s.details["overall_sentiment"], "very_bullish");
        assert_eq!(s.details["significant_events"][0]["type"], "listing");
    }

    #[test]
    fn hack_news_is_bearish() {
        let input = NarrativeInput {
            news: vec![news("Bridge hacked, funds drained", SentimentLabel::Bearish, 2)],
            mention_count: 50,
            historical_mention_avg: 100.0,
            ..Default::default()
        };
        let s = NarrativeIndicator.evaluate(&input, now()).unwrap();
        assert!(s.value < 40.0, "got {}", s.value);
        assert_eq!(s.details["significant_events"][0]["type"], "hack");
    }

    #[test]
    fn delisting_does_not_count_as_listing() {
        let tokens = tokenize("Token faces delisting next week");
        assert!(!contains_keyword(&tokens, "listing"));
        assert!(contains_keyword(&tokens, "delisting"));
        assert!(contains_keyword(&tokenize("Protocol upgraded"), "upgrade"));
        assert!(contains_keyword(&tokenize("Two new ETFs"), "etf"));
        assert!(!contains_keyword(&tokenize("banner ads"), "ban"));
    }

    #[test]
    fn scores_preferred_over_labels() {
        let input = NarrativeInput {
            news: vec![news("quiet day", SentimentLabel::Bullish, 30)],
            sentiment_scores: vec![-1.0, -1.0],
            ..Default::default()
        };
        let s = NarrativeIndicator.evaluate(&input, now()).unwrap();
        assert_eq!(s.details["sub_scores"]["sentiment"], 15.0);
        assert_eq!(s.details["overall_sentiment"], "very_bearish");
    }

    #[test]
    fn events_are_ranked_and_capped() {
        let kinds = [
            "neutral",
            "etf",
            "hack",
            "listing",
            "upgrade",
            "lawsuit",
            "unknown_kind",
        ];
        let events: Vec<NarrativeEvent> = kinds
            .iter()
            .map(|t| NarrativeEvent {
                event_type: t.to_string(),
                title: format!("{} event", t),
            })
            .collect();
        let input = NarrativeInput {
            events,
            ..Default::default()
        };
        let s = NarrativeIndicator.evaluate(&input, now()).unwrap();
        let top = s.details["significant_events"].as_array().unwrap();
        assert_eq!(top.len(), 5);
        // etf and hack tie on distance from neutral; input order breaks the tie
        assert_eq!(top[0]["type"], "etf");
        assert_eq!(top[1]["type"], "hack");
        assert_eq!(top[2]["type"], "listing");
    }

    #[test]
    fn mention_curve() {
        assert_eq!(mention_score(0, 0.0), 50.0);
        assert_eq!(mention_score(3, 0.0), 60.0);
        assert_eq!(mention_score(300, 100.0), 90.0);
        assert_eq!(mention_score(100, 100.0), 50.0);
        assert_eq!(mention_score(0, 100.0), 20.0);
    }

    #[test]
    fn event_impact_table() {
        assert_eq!(event_impact("etf"), Some(85.0));
        assert_eq!(event_impact("hack"), Some(15.0));
        assert_eq!(event_impact("rumor"), None);
    }
}

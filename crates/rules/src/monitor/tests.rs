//! Tests for the threshold monitor.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use pulse_core::Category;

use super::core::{amount_display, top_factors, whale_severity};
use super::*;
use crate::alerts::{AlertKind, AlertSeverity};
use crate::config::ThresholdConfigSpec;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn minutes(m: i64) -> chrono::Duration {
    chrono::Duration::minutes(m)
}

fn kinds(alerts: &[crate::AlertCandidate]) -> Vec<AlertKind> {
    alerts.iter().map(|a| a.kind).collect()
}

// -- zone alerts -------------------------------------------------------

#[test]
fn entering_high_zone_fires_once() {
    let m = ThresholdMonitor::default();
    m.seed_last_score("BTC", 65.0);
    let alerts = m.check_score("btc", "BTC", 75.0, None, t0());
    assert_eq!(kinds(&alerts), vec![AlertKind::ScoreHigh]);
    assert_eq!(alerts[0].severity, AlertSeverity::High);
    assert_eq!(alerts[0].context_f64("previous_score"), Some(65.0));
}

#[test]
fn staying_inside_high_zone_is_silent() {
    let m = ThresholdMonitor::default();
    m.seed_last_score("BTC", 72.0);
    let alerts = m.check_score("btc", "BTC", 75.0, None, t0());
    assert!(alerts.is_empty());
}

#[test]
fn zone_entry_and_spike_fire_together() {
    let m = ThresholdMonitor::default();
    m.seed_last_score("SOL", 50.0);
    let alerts = m.check_score("sol", "SOL", 70.0, None, t0());
    assert_eq!(kinds(&alerts), vec![AlertKind::ScoreHigh, AlertKind::ScoreSpike]);
    assert_eq!(alerts[1].context_f64("delta"), Some(20.0));
}

#[test]
fn critical_overrides_high() {
    let m = ThresholdMonitor::default();
    m.seed_last_score("ETH", 60.0);
    let alerts = m.check_score("eth", "ETH", 90.0, None, t0());
    assert!(alerts.iter().any(|a| a.kind == AlertKind::ScoreCritical));
    assert!(alerts.iter().all(|a| a.kind != AlertKind::ScoreHigh));
    assert_eq!(alerts[0].severity, AlertSeverity::Critical);
}

#[test]
fn cold_start_never_fires_delta_alerts() {
    let m = ThresholdMonitor::default();
    let alerts = m.check_score("btc", "BTC", 90.0, None, t0());
    assert_eq!(kinds(&alerts), vec![AlertKind::ScoreCritical]);
    assert_eq!(m.last_score("BTC"), Some(90.0));
}

#[test]
fn cold_start_inside_high_zone_is_not_an_entry() {
    let m = ThresholdMonitor::default();
    let alerts = m.check_score("btc", "BTC", 75.0, None, t0());
    assert!(alerts.is_empty());
}

// -- delta alerts ------------------------------------------------------

#[test]
fn drop_reports_magnitude_and_keeps_sign_in_context() {
    let m = ThresholdMonitor::default();
    m.seed_last_score("ADA", 60.0);
    let alerts = m.check_score("ada", "ADA", 40.0, None, t0());
    assert_eq!(kinds(&alerts), vec![AlertKind::ScoreDrop]);
    assert_eq!(alerts[0].severity, AlertSeverity::Medium);
    assert_eq!(alerts[0].context_f64("delta"), Some(20.0));
    assert_eq!(alerts[0].context_f64("raw_delta"), Some(-20.0));
    assert!(alerts[0].title.contains("fell 20 points"), "{}", alerts[0].title);
}

#[test]
fn non_finite_score_leaves_state_alone() {
    let m = ThresholdMonitor::default();
    m.seed_last_score("BTC", 50.0);
    for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        assert!(m.check_score("btc", "BTC", bad, None, t0()).is_empty());
    }
    assert_eq!(m.last_score("BTC"), Some(50.0));

    let alerts = m.check_score("btc", "BTC", 72.0, None, t0());
    assert!(kinds(&alerts).contains(&AlertKind::ScoreHigh));
}

#[test]
fn small_moves_are_ignored() {
    let m = ThresholdMonitor::default();
    m.seed_last_score("ADA", 50.0);
    assert!(m.check_score("ada", "ADA", 64.9, None, t0()).is_empty());
    assert!(m.check_score("ada", "ADA", 50.0, None, t0()).is_empty());
}

// -- cooldowns ---------------------------------------------------------

#[test]
fn cooldown_suppresses_until_expiry() {
    let m = ThresholdMonitor::default();
    let now = t0();

    m.seed_last_score("BTC", 60.0);
    let first = m.check_score("btc", "BTC", 75.0, None, now);
    assert!(first.iter().any(|a| a.kind == AlertKind::ScoreHigh));

    // Leave and re-enter the zone inside the 60 minute window.
    m.check_score("btc", "BTC", 65.0, None, now + minutes(10));
    let second = m.check_score("btc", "BTC", 75.0, None, now + minutes(20));
    assert!(second.iter().all(|a| a.kind != AlertKind::ScoreHigh));
    assert!(m.in_cooldown(AlertKind::ScoreHigh, "BTC", now + minutes(59)));

    m.check_score("btc", "BTC", 65.0, None, now + minutes(61));
    let third = m.check_score("btc", "BTC", 75.0, None, now + minutes(62));
    assert!(third.iter().any(|a| a.kind == AlertKind::ScoreHigh));
}

#[test]
fn critical_repeats_after_thirty_minutes() {
    let m = ThresholdMonitor::default();
    let now = t0();
    assert_eq!(m.check_score("btc", "BTC", 90.0, None, now).len(), 1);
    assert!(m.check_score("btc", "BTC", 91.0, None, now + minutes(29)).is_empty());
    let again = m.check_score("btc", "BTC", 92.0, None, now + minutes(30));
    assert_eq!(kinds(&again), vec![AlertKind::ScoreCritical]);
}

#[test]
fn cooldowns_are_per_symbol() {
    let m = ThresholdMonitor::default();
    let now = t0();
    assert!(m.check_whale_transaction("btc", "BTC", 12e6, 200.0, "transfer", now).is_some());
    assert!(m.check_whale_transaction("eth", "ETH", 12e6, 4000.0, "transfer", now).is_some());
    assert!(m.check_whale_transaction("btc", "BTC", 60e6, 900.0, "transfer", now).is_none());
}

#[test]
fn cooldown_override_from_config() {
    let mut spec = ThresholdConfigSpec::default();
    spec.cooldowns.insert(AlertKind::WhaleLargeTx, "1m".to_string());
    let m = ThresholdMonitor::new(spec.compile().unwrap());
    let now = t0();
    assert!(m.check_whale_transaction("btc", "BTC", 12e6, 200.0, "transfer", now).is_some());
    let later = now + minutes(1);
    assert!(m.check_whale_transaction("btc", "BTC", 12e6, 200.0, "transfer", later).is_some());
}

#[test]
fn year_long_cooldown_holds() {
    let mut spec = ThresholdConfigSpec::default();
    spec.cooldowns.insert(AlertKind::ScoreCritical, "365d".to_string());
    let m = ThresholdMonitor::new(spec.compile().unwrap());
    let now = t0();
    assert_eq!(m.check_score("btc", "BTC", 90.0, None, now).len(), 1);
    assert!(m.check_score("btc", "BTC", 90.0, None, now).is_empty());
    assert!(m.in_cooldown(AlertKind::ScoreCritical, "BTC", now + chrono::Duration::days(364)));
}

#[test]
fn cooldown_past_the_end_of_time_saturates() {
    let m = ThresholdMonitor::default();
    let now = DateTime::<Utc>::MAX_UTC - minutes(1);
    assert_eq!(m.check_score("btc", "BTC", 90.0, None, now).len(), 1);
    assert!(m.check_score("btc", "BTC", 90.0, None, now).is_empty());
    assert!(m.in_cooldown(AlertKind::ScoreCritical, "BTC", now));
}

#[test]
fn disabled_kind_never_fires() {
    let mut spec = ThresholdConfigSpec::default();
    spec.disabled.push(AlertKind::ScoreSpike);
    let m = ThresholdMonitor::new(spec.compile().unwrap());
    m.seed_last_score("SOL", 50.0);
    let alerts = m.check_score("sol", "SOL", 70.0, None, t0());
    assert_eq!(kinds(&alerts), vec![AlertKind::ScoreHigh]);
}

// -- whale -------------------------------------------------------------

#[test]
fn whale_tiering() {
    let now = t0();

    let m = ThresholdMonitor::default();
    assert!(m.check_whale_transaction("btc", "BTC", 1_000_000.0, 15.0, "transfer", now).is_none());

    let m = ThresholdMonitor::default();
    let a = m.check_whale_transaction("btc", "BTC", 10_000_000.0, 150.0, "transfer", now).unwrap();
    assert_eq!(a.severity, AlertSeverity::Medium);
    assert!(a.title.contains("$10.0M"), "{}", a.title);
    assert!(a.message.contains("$10,000,000"), "{}", a.message);

    let m = ThresholdMonitor::default();
    let a = m.check_whale_transaction("btc", "BTC", 50_000_000.0, 750.0, "transfer", now).unwrap();
    assert_eq!(a.severity, AlertSeverity::Critical);
}

#[test]
fn whale_severity_tiers() {
    assert_eq!(whale_severity(5e6), AlertSeverity::Low);
    assert_eq!(whale_severity(10e6), AlertSeverity::Medium);
    assert_eq!(whale_severity(19.9e6), AlertSeverity::Medium);
    assert_eq!(whale_severity(20e6), AlertSeverity::High);
    assert_eq!(whale_severity(50e6), AlertSeverity::Critical);
}

#[test]
fn compact_amounts() {
    assert_eq!(amount_display(1_200_000_000.0), "1.2B");
    assert_eq!(amount_display(15_000_000.0), "15.0M");
    assert_eq!(amount_display(750_000.0), "750K");
}

#[test]
fn whale_pattern_direction() {
    let m = ThresholdMonitor::default();
    let now = t0();
    let acc = WhaleActivity {
        tx_count: 6,
        window_hours: 24,
        inflow_usd: 2e6,
        outflow_usd: 30e6,
    };
    let a = m.check_whale_pattern("btc", "BTC", &acc, now).unwrap();
    assert_eq!(a.kind, AlertKind::WhaleAccumulation);
    assert!(a.message.contains("6 transactions in the last 24h"), "{}", a.message);

    let dist = WhaleActivity {
        tx_count: 4,
        window_hours: 24,
        inflow_usd: 25e6,
        outflow_usd: 1e6,
    };
    let d = m.check_whale_pattern("eth", "ETH", &dist, now).unwrap();
    assert_eq!(d.kind, AlertKind::WhaleDistribution);

    let balanced = WhaleActivity {
        tx_count: 4,
        window_hours: 24,
        inflow_usd: 10e6,
        outflow_usd: 10.5e6,
    };
    assert!(m.check_whale_pattern("sol", "SOL", &balanced, now).is_none());

    let small = WhaleActivity {
        tx_count: 2,
        window_hours: 24,
        inflow_usd: 0.0,
        outflow_usd: 5e6,
    };
    assert!(m.check_whale_pattern("ada", "ADA", &small, now).is_none());
}

// -- price & volume ----------------------------------------------------

#[test]
fn price_surge_and_dump() {
    let m = ThresholdMonitor::default();
    let now = t0();
    assert!(m.check_price_change("btc", "BTC", 9.9, 60_000.0, "24h", now).is_none());

    let s = m.check_price_change("btc", "BTC", 12.5, 68_000.0, "24h", now).unwrap();
    assert_eq!(s.kind, AlertKind::PriceSurge);
    assert!(s.title.contains("+12.5%"), "{}", s.title);
    assert!(s.message.contains("$68,000.00"), "{}", s.message);

    let d = m.check_price_change("eth", "ETH", -11.0, 3_000.0, "24h", now).unwrap();
    assert_eq!(d.kind, AlertKind::PriceDump);
    assert!(d.title.contains("down 11.0%"), "{}", d.title);
    assert_eq!(d.context_f64("change_percent"), Some(-11.0));

    assert!(m.check_price_change("btc", "BTC", 15.0, 70_000.0, "24h", now).is_none());
}

#[test]
fn volume_spike_boundary() {
    let now = t0();
    let m = ThresholdMonitor::default();
    assert!(m.check_volume_spike("btc", "BTC", 290.0, 100.0, now).is_none());

    let a = m.check_volume_spike("btc", "BTC", 300.0, 100.0, now).unwrap();
    assert_eq!(a.kind, AlertKind::VolumeSpike);
    assert_eq!(a.context_f64("multiplier"), Some(3.0));
}

#[test]
fn volume_spike_needs_positive_average() {
    let m = ThresholdMonitor::default();
    assert!(m.check_volume_spike("btc", "BTC", 300.0, 0.0, t0()).is_none());
    assert!(m.check_volume_spike("btc", "BTC", 300.0, -5.0, t0()).is_none());
}

// -- system ------------------------------------------------------------

#[test]
fn system_error_is_throttled_per_component() {
    let m = ThresholdMonitor::default();
    let now = t0();
    let a = m.report_system_error("netflow-collector", "timeout", now).unwrap();
    assert_eq!(a.symbol, SYSTEM_SYMBOL);
    assert_eq!(a.severity, AlertSeverity::Critical);
    assert_eq!(a.message, "Component netflow-collector failed: timeout");

    assert!(m.report_system_error("netflow-collector", "timeout", now + minutes(4)).is_none());
    assert!(m.report_system_error("news-collector", "401", now + minutes(4)).is_some());
    assert!(m.report_system_error("netflow-collector", "timeout", now + minutes(5)).is_some());
}

#[test]
fn data_delay_threshold() {
    let m = ThresholdMonitor::default();
    assert!(m.check_data_delay("coingecko", 12.0, t0()).is_none());
    let a = m.check_data_delay("coingecko", 45.0, t0()).unwrap();
    assert_eq!(a.kind, AlertKind::SystemDataDelay);
    assert_eq!(a.severity, AlertSeverity::Low);
    assert_eq!(a.message, "Data from coingecko is 45 minutes late.");
}

// -- rendering ---------------------------------------------------------

#[test]
fn high_alert_names_top_factors() {
    let m = ThresholdMonitor::default();
    m.seed_last_score("BTC", 60.0);
    let mut scores = BTreeMap::new();
    scores.insert(Category::Whale, 81.0);
    scores.insert(Category::Volume, 55.0);
    scores.insert(Category::Netflow, 78.4);
    let alerts = m.check_score("btc", "BTC", 72.0, Some(&scores), t0());
    let high = &alerts[0];
    assert_eq!(high.title, "BTC entered the explosion zone");
    assert!(
        high.message.contains("Main factors: Whale Activity (81), Exchange Netflow (78)"),
        "{}",
        high.message
    );
    assert_eq!(high.context["indicator_scores"]["whale"], 81.0);
}

#[test]
fn top_factors_without_scores() {
    assert_eq!(top_factors(None), "insufficient data");
    assert_eq!(top_factors(Some(&BTreeMap::new())), "insufficient data");
}

// -- state management --------------------------------------------------

#[test]
fn reset_clears_scores_and_cooldowns() {
    let m = ThresholdMonitor::default();
    let now = t0();
    m.check_score("btc", "BTC", 90.0, None, now);
    assert!(m.in_cooldown(AlertKind::ScoreCritical, "BTC", now));
    m.reset();
    assert!(!m.in_cooldown(AlertKind::ScoreCritical, "BTC", now));
    assert_eq!(m.last_score("BTC"), None);
    assert_eq!(m.check_score("btc", "BTC", 90.0, None, now).len(), 1);
}

#[test]
fn prune_and_stats() {
    let m = ThresholdMonitor::default();
    let now = t0();
    m.check_score("btc", "BTC", 90.0, None, now);
    m.check_whale_transaction("btc", "BTC", 12e6, 200.0, "transfer", now);

    let stats = m.stats(now);
    assert_eq!(stats.check_count, 2);
    assert_eq!(stats.alert_count, 2);
    assert_eq!(stats.active_cooldowns, 2);
    assert_eq!(stats.tracked_symbols, 1);

    // Whale cooldown (5m) expired, critical (30m) still active.
    assert_eq!(m.prune_expired(now + minutes(10)), 1);
    assert_eq!(m.stats(now + minutes(10)).active_cooldowns, 1);
}

#[test]
fn concurrent_checks_do_not_double_fire() {
    use std::sync::Arc;
    use std::thread;

    let m = Arc::new(ThresholdMonitor::default());
    m.seed_last_score("BTC", 50.0);
    let now = t0();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let m = Arc::clone(&m);
            thread::spawn(move || m.check_score("btc", "BTC", 72.0, None, now))
        })
        .collect();

    let all: Vec<_> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    assert_eq!(all.iter().filter(|a| a.kind == AlertKind::ScoreHigh).count(), 1);
    assert_eq!(all.iter().filter(|a| a.kind == AlertKind::ScoreSpike).count(), 1);
}

#[test]
fn template_cooldown_defaults_apply() {
    let m = ThresholdMonitor::default();
    assert_eq!(
        m.thresholds().cooldown(AlertKind::ScoreHigh),
        Duration::from_secs(3_600)
    );
}

//! The [`ThresholdMonitor`] decides when scores and raw events become alerts.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use pulse_core::{Category, Details};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::alerts::{AlertCandidate, AlertKind, AlertSeverity};
use crate::config::CompiledThresholds;
use crate::templates::{AlertTemplate, TemplateRenderer};

use super::state::MonitorState;
use super::{MonitorStats, WhaleActivity, WhaleDirection, SYSTEM_SYMBOL};

/// Stateful watcher over composite scores and raw market events.
///
/// Holds the last composite score per symbol and a cooldown deadline per
/// `(alert kind, symbol)`. All state sits behind one mutex so every check
/// reads, decides and writes atomically: two concurrent calls for the same
/// symbol cannot both see a stale last score or both pass an expired
/// cooldown.
///
/// Every operation takes `now` explicitly; callers pass `Utc::now()` in
/// production and fixed instants in tests.
pub struct ThresholdMonitor {
    thresholds: CompiledThresholds,
    renderer: TemplateRenderer,
    state: Mutex<MonitorState>,
    check_count: AtomicU64,
    alert_count: AtomicU64,
}

impl ThresholdMonitor {
    pub fn new(thresholds: CompiledThresholds) -> Self {
        Self {
            thresholds,
            renderer: TemplateRenderer::new(),
            state: Mutex::new(MonitorState::default()),
            check_count: AtomicU64::new(0),
            alert_count: AtomicU64::new(0),
        }
    }

    pub fn thresholds(&self) -> &CompiledThresholds {
        &self.thresholds
    }

    // The maps stay consistent even if a holder panicked mid-check.
    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Score checks ───────────────────────────────────────────────

    /// Evaluate a new composite score for `symbol`.
    ///
    /// Zone alerts (critical, else high on zone entry) and delta alerts
    /// (spike, else drop) are independent and may both fire. A symbol seen
    /// for the first time uses its current score as the previous one.
    pub fn check_score(
        &self,
        asset_id: &str,
        symbol: &str,
        current: f64,
        indicator_scores: Option<&BTreeMap<Category, f64>>,
        now: DateTime<Utc>,
    ) -> Vec<AlertCandidate> {
        self.check_count.fetch_add(1, Ordering::Relaxed);
        if !current.is_finite() {
            warn!(symbol = %symbol, score = current, "ignoring non-finite score");
            return Vec::new();
        }
        let t = self.thresholds.score;
        let mut alerts = Vec::new();

        let mut state = self.lock();
        let previous = state.exchange_last_score(symbol, current);
        let scores = indicator_scores_value(indicator_scores);

        if current >= t.critical {
            if self.ready(&state, AlertKind::ScoreCritical, symbol, now) {
                let ctx = details(json!({
                    "symbol": symbol,
                    "score": current,
                    "threshold": t.critical,
                    "indicator_scores": scores,
                }));
                alerts.push(self.emit(
                    &mut state,
                    AlertKind::ScoreCritical,
                    None,
                    asset_id,
                    symbol,
                    symbol,
                    ctx,
                    now,
                ));
            }
        } else if current >= t.high
            && previous < t.high
            && self.ready(&state, AlertKind::ScoreHigh, symbol, now)
        {
            let ctx = details(json!({
                "symbol": symbol,
                "score": current,
                "previous_score": previous,
                "threshold": t.high,
                "factors": top_factors(indicator_scores),
                "indicator_scores": scores,
            }));
            alerts.push(self.emit(
                &mut state,
                AlertKind::ScoreHigh,
                None,
                asset_id,
                symbol,
                symbol,
                ctx,
                now,
            ));
        }

        let delta = current - previous;
        let delta_kind = if delta >= t.spike_delta {
            Some(AlertKind::ScoreSpike)
        } else if delta <= t.drop_delta {
            Some(AlertKind::ScoreDrop)
        } else {
            None
        };
        if let Some(kind) = delta_kind {
            if self.ready(&state, kind, symbol, now) {
                // Templates show the magnitude; context keeps the sign.
                let shown = if kind == AlertKind::ScoreDrop { delta.abs() } else { delta };
                let mut ctx = details(json!({
                    "symbol": symbol,
                    "score": current,
                    "previous_score": previous,
                    "period": "last check",
                }));
                ctx.insert("delta".to_string(), json!(shown));
                ctx.insert("raw_delta".to_string(), json!(delta));
                alerts.push(self.emit(&mut state, kind, None, asset_id, symbol, symbol, ctx, now));
            }
        }

        alerts
    }

    // ── Raw event checks ───────────────────────────────────────────

    /// A single large transfer. Severity escalates with size.
    pub fn check_whale_transaction(
        &self,
        asset_id: &str,
        symbol: &str,
        amount_usd: f64,
        amount_crypto: f64,
        tx_type: &str,
        now: DateTime<Utc>,
    ) -> Option<AlertCandidate> {
        self.check_count.fetch_add(1, Ordering::Relaxed);
        if amount_usd.is_nan() || amount_usd < self.thresholds.whale.min_usd {
            return None;
        }

        let kind = AlertKind::WhaleLargeTx;
        let mut state = self.lock();
        if !self.ready(&state, kind, symbol, now) {
            return None;
        }

        let ctx = details(json!({
            "symbol": symbol,
            "amount_usd": amount_usd,
            "amount_crypto": amount_crypto,
            "amount_display": amount_display(amount_usd),
            "tx_type": tx_type,
        }));
        let severity = whale_severity(amount_usd);
        Some(self.emit(&mut state, kind, Some(severity), asset_id, symbol, symbol, ctx, now))
    }

    /// Sustained directional whale flow over a window.
    pub fn check_whale_pattern(
        &self,
        asset_id: &str,
        symbol: &str,
        activity: &WhaleActivity,
        now: DateTime<Utc>,
    ) -> Option<AlertCandidate> {
        self.check_count.fetch_add(1, Ordering::Relaxed);
        let total = activity.total_usd();
        if total.is_nan() || total < self.thresholds.whale.pattern_min_usd {
            return None;
        }
        let kind = match activity.direction() {
            WhaleDirection::Accumulation => AlertKind::WhaleAccumulation,
            WhaleDirection::Distribution => AlertKind::WhaleDistribution,
            WhaleDirection::Neutral => return None,
        };

        let mut state = self.lock();
        if !self.ready(&state, kind, symbol, now) {
            return None;
        }
        let ctx = details(json!({
            "symbol": symbol,
            "tx_count": activity.tx_count,
            "hours": activity.window_hours,
            "total_usd": total,
            "inflow_usd": activity.inflow_usd,
            "outflow_usd": activity.outflow_usd,
            "net_flow_usd": activity.net_flow_usd(),
        }));
        Some(self.emit(&mut state, kind, None, asset_id, symbol, symbol, ctx, now))
    }

    /// Price move over `period` (e.g. `"24h"`).
    pub fn check_price_change(
        &self,
        asset_id: &str,
        symbol: &str,
        change_percent: f64,
        current_price: f64,
        period: &str,
        now: DateTime<Utc>,
    ) -> Option<AlertCandidate> {
        self.check_count.fetch_add(1, Ordering::Relaxed);
        let p = self.thresholds.price;
        let kind = if change_percent >= p.surge_percent {
            AlertKind::PriceSurge
        } else if change_percent <= p.dump_percent {
            AlertKind::PriceDump
        } else {
            return None;
        };

        let mut state = self.lock();
        if !self.ready(&state, kind, symbol, now) {
            return None;
        }
        let shown = if kind == AlertKind::PriceDump {
            change_percent.abs()
        } else {
            change_percent
        };
        let ctx = details(json!({
            "symbol": symbol,
            "change": shown,
            "change_percent": change_percent,
            "price": current_price,
            "current_price": current_price,
            "period": period,
        }));
        Some(self.emit(&mut state, kind, None, asset_id, symbol, symbol, ctx, now))
    }

    /// Current volume against its trailing average.
    pub fn check_volume_spike(
        &self,
        asset_id: &str,
        symbol: &str,
        current_volume: f64,
        avg_volume: f64,
        now: DateTime<Utc>,
    ) -> Option<AlertCandidate> {
        self.check_count.fetch_add(1, Ordering::Relaxed);
        if avg_volume.is_nan() || avg_volume <= 0.0 {
            return None;
        }
        let multiplier = current_volume / avg_volume;
        if multiplier.is_nan() || multiplier < self.thresholds.volume.spike_multiplier {
            return None;
        }

        let kind = AlertKind::VolumeSpike;
        let mut state = self.lock();
        if !self.ready(&state, kind, symbol, now) {
            return None;
        }
        let ctx = details(json!({
            "symbol": symbol,
            "current_volume": current_volume,
            "avg_volume": avg_volume,
            "multiplier": multiplier,
        }));
        Some(self.emit(&mut state, kind, None, asset_id, symbol, symbol, ctx, now))
    }

    // ── System alerts ──────────────────────────────────────────────

    /// Report a failing component. Throttled per component.
    pub fn report_system_error(
        &self,
        component: &str,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> Option<AlertCandidate> {
        let kind = AlertKind::SystemError;
        let mut state = self.lock();
        if !self.ready(&state, kind, component, now) {
            return None;
        }
        let ctx = details(json!({
            "component": component,
            "error_message": error_message,
        }));
        Some(self.emit(&mut state, kind, None, SYSTEM_SYMBOL, SYSTEM_SYMBOL, component, ctx, now))
    }

    /// Alert when a data source has not delivered for too long.
    pub fn check_data_delay(
        &self,
        source: &str,
        delay_minutes: f64,
        now: DateTime<Utc>,
    ) -> Option<AlertCandidate> {
        self.check_count.fetch_add(1, Ordering::Relaxed);
        if delay_minutes.is_nan() || delay_minutes < self.thresholds.system.data_delay_minutes {
            return None;
        }
        let kind = AlertKind::SystemDataDelay;
        let mut state = self.lock();
        if !self.ready(&state, kind, source, now) {
            return None;
        }
        let ctx = details(json!({
            "source": source,
            "delay_minutes": delay_minutes.round() as i64,
        }));
        Some(self.emit(&mut state, kind, None, SYSTEM_SYMBOL, SYSTEM_SYMBOL, source, ctx, now))
    }

    // ── State management ───────────────────────────────────────────

    /// Forget all scores and cooldowns. Counters are kept.
    pub fn reset(&self) {
        self.lock().clear();
        info!("threshold monitor state reset");
    }

    /// Drop cooldown entries that have expired by `now`.
    pub fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let removed = self.lock().prune(now);
        if removed > 0 {
            debug!(removed, "pruned expired cooldowns");
        }
        removed
    }

    /// Warm-start the hysteresis state, e.g. from a persisted score.
    pub fn seed_last_score(&self, symbol: &str, score: f64) {
        self.lock().last_score.insert(symbol.to_string(), score);
    }

    pub fn last_score(&self, symbol: &str) -> Option<f64> {
        self.lock().last_score.get(symbol).copied()
    }

    /// Whether `kind` is cooling down for `key` at `now`.
    pub fn in_cooldown(&self, kind: AlertKind, key: &str, now: DateTime<Utc>) -> bool {
        self.lock().cooling_until(kind, key, now).is_some()
    }

    pub fn stats(&self, now: DateTime<Utc>) -> MonitorStats {
        let state = self.lock();
        MonitorStats {
            check_count: self.check_count.load(Ordering::Relaxed),
            alert_count: self.alert_count.load(Ordering::Relaxed),
            active_cooldowns: state.active_cooldowns(now),
            tracked_symbols: state.last_score.len(),
        }
    }

    // ── Internals ──────────────────────────────────────────────────

    fn ready(&self, state: &MonitorState, kind: AlertKind, key: &str, now: DateTime<Utc>) -> bool {
        if !self.thresholds.is_enabled(kind) {
            return false;
        }
        match state.cooling_until(kind, key, now) {
            Some(until) => {
                debug!(
                    kind = %kind,
                    key = %key,
                    "alert suppressed ({}s of cooldown left)",
                    (until - now).num_seconds(),
                );
                false
            }
            None => true,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn emit(
        &self,
        state: &mut MonitorState,
        kind: AlertKind,
        severity: Option<AlertSeverity>,
        asset_id: &str,
        symbol: &str,
        cooldown_key: &str,
        context: Details,
        now: DateTime<Utc>,
    ) -> AlertCandidate {
        let template = AlertTemplate::for_kind(kind);
        let (title, message) = self.renderer.render_alert(template, &context);
        // Unrepresentable cooldowns never expire.
        let until = chrono::Duration::from_std(self.thresholds.cooldown(kind))
            .ok()
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        state.start_cooldown(kind, cooldown_key, until);
        self.alert_count.fetch_add(1, Ordering::Relaxed);

        let severity = severity.unwrap_or(template.default_severity);
        info!(kind = %kind, symbol = %symbol, severity = %severity, "alert candidate emitted");

        AlertCandidate {
            id: Uuid::new_v4(),
            kind,
            severity,
            title,
            message,
            asset_id: asset_id.to_string(),
            symbol: symbol.to_string(),
            context,
            created_at: now,
        }
    }
}

impl Default for ThresholdMonitor {
    fn default() -> Self {
        Self::new(CompiledThresholds::default())
    }
}

// ── Helpers ────────────────────────────────────────────────────────

fn details(value: Value) -> Details {
    match value {
        Value::Object(map) => map,
        _ => Details::new(),
    }
}

fn indicator_scores_value(scores: Option<&BTreeMap<Category, f64>>) -> Value {
    let map: Details = scores
        .into_iter()
        .flatten()
        .map(|(c, v)| (c.as_str().to_string(), json!(v)))
        .collect();
    Value::Object(map)
}

/// "Whale Activity (81), Exchange Netflow (78)": the two highest scores.
pub(crate) fn top_factors(scores: Option<&BTreeMap<Category, f64>>) -> String {
    let mut sorted: Vec<(Category, f64)> = match scores {
        Some(s) if !s.is_empty() => s.iter().map(|(c, v)| (*c, *v)).collect(),
        _ => return "insufficient data".to_string(),
    };
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1));
    sorted
        .iter()
        .take(2)
        .map(|(c, v)| format!("{} ({:.0})", c.label(), v))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn whale_severity(amount_usd: f64) -> AlertSeverity {
    if amount_usd >= 50_000_000.0 {
        AlertSeverity::Critical
    } else if amount_usd >= 20_000_000.0 {
        AlertSeverity::High
    } else if amount_usd >= 10_000_000.0 {
        AlertSeverity::Medium
    } else {
        AlertSeverity::Low
    }
}

/// Compact dollar amount: `1.2B`, `15.0M`, `750K`.
pub(crate) fn amount_display(amount_usd: f64) -> String {
    if amount_usd >= 1_000_000_000.0 {
        format!("{:.1}B", amount_usd / 1_000_000_000.0)
    } else if amount_usd >= 1_000_000.0 {
        format!("{:.1}M", amount_usd / 1_000_000.0)
    } else {
        format!("{:.0}K", amount_usd / 1_000.0)
    }
}

//! In-memory monitor state: last score per symbol and cooldown deadlines.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::alerts::AlertKind;

/// Mutable state owned by one [`ThresholdMonitor`](super::ThresholdMonitor).
///
/// Cooldown keys are `(kind, key)` where `key` is the asset symbol for
/// market alerts and the component or source name for system alerts.
#[derive(Debug, Default)]
pub(crate) struct MonitorState {
    pub(crate) last_score: HashMap<String, f64>,
    pub(crate) cooldown_until: HashMap<(AlertKind, String), DateTime<Utc>>,
}

impl MonitorState {
    /// Swap in `current` as the last score and return the previous one,
    /// defaulting to `current` on first sight.
    pub(crate) fn exchange_last_score(&mut self, symbol: &str, current: f64) -> f64 {
        match self.last_score.insert(symbol.to_string(), current) {
            Some(prev) => prev,
            None => current,
        }
    }

    pub(crate) fn cooling_until(
        &self,
        kind: AlertKind,
        key: &str,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        self.cooldown_until
            .get(&(kind, key.to_string()))
            .copied()
            .filter(|until| now < *until)
    }

    pub(crate) fn start_cooldown(&mut self, kind: AlertKind, key: &str, until: DateTime<Utc>) {
        self.cooldown_until.insert((kind, key.to_string()), until);
    }

    /// Drop expired cooldowns; returns how many were removed.
    pub(crate) fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.cooldown_until.len();
        self.cooldown_until.retain(|_, until| now < *until);
        before - self.cooldown_until.len()
    }

    pub(crate) fn active_cooldowns(&self, now: DateTime<Utc>) -> usize {
        self.cooldown_until.values().filter(|u| now < **u).count()
    }

    pub(crate) fn clear(&mut self) {
        self.last_score.clear();
        self.cooldown_until.clear();
    }
}

//! The process-wide alert template table.

use std::time::Duration;

use crate::alerts::{AlertKind, AlertSeverity};

/// Static description of how one alert kind is presented and throttled.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertTemplate {
    pub kind: AlertKind,
    pub default_severity: AlertSeverity,
    /// Minijinja source for the title.
    pub title: &'static str,
    /// Minijinja source for the message body.
    pub message: &'static str,
    /// Minimum gap between two alerts of this kind for one symbol.
    pub cooldown: Duration,
}

impl AlertTemplate {
    /// Template for `kind`. The table covers every kind.
    pub fn for_kind(kind: AlertKind) -> &'static AlertTemplate {
        &TEMPLATES[kind as usize]
    }

    /// Every template, in [`AlertKind::ALL`] order.
    pub fn all() -> &'static [AlertTemplate] {
        &TEMPLATES
    }
}

const fn minutes(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}

// Indexed by `AlertKind` discriminant; order must match the enum.
static TEMPLATES: [AlertTemplate; 12] = [
    // ── Score ───────────────────────────────────────────────────────
    AlertTemplate {
        kind: AlertKind::ScoreHigh,
        default_severity: AlertSeverity::High,
        title: "{{ symbol }} entered the explosion zone",
        message: "{{ symbol }} reached score {{ score | round(1) }} (high zone). \
                  Main factors: {{ factors }}. Watch closely.",
        cooldown: minutes(60),
    },
    AlertTemplate {
        kind: AlertKind::ScoreCritical,
        default_severity: AlertSeverity::Critical,
        title: "{{ symbol }} at CRITICAL level",
        message: "ATTENTION: {{ symbol }} reached score {{ score | round(1) }}! \
                  Extreme conditions detected. High probability of an explosive move.",
        cooldown: minutes(30),
    },
    AlertTemplate {
        kind: AlertKind::ScoreSpike,
        default_severity: AlertSeverity::High,
        title: "{{ symbol }} score jumped +{{ delta | round(0) }} points",
        message: "{{ symbol }} moved {{ delta | signed(1) }} points since the {{ period }}. \
                  Current score: {{ score | round(1) }}. Rapid change suggests abnormal activity.",
        cooldown: minutes(30),
    },
    AlertTemplate {
        kind: AlertKind::ScoreDrop,
        default_severity: AlertSeverity::Medium,
        title: "{{ symbol }} score fell {{ delta | round(0) }} points",
        message: "{{ symbol }} fell {{ delta | round(1) }} points since the {{ period }}. \
                  Current score: {{ score | round(1) }}. Upward pressure may be fading.",
        cooldown: minutes(60),
    },
    // ── Whale ───────────────────────────────────────────────────────
    AlertTemplate {
        kind: AlertKind::WhaleLargeTx,
        default_severity: AlertSeverity::Medium,
        title: "{{ symbol }} whale move of ${{ amount_display }}",
        message: "A whale moved {{ amount_crypto | round(2) }} {{ symbol }} \
                  (${{ amount_usd | usd }}). Type: {{ tx_type }}.",
        cooldown: minutes(5),
    },
    AlertTemplate {
        kind: AlertKind::WhaleAccumulation,
        default_severity: AlertSeverity::High,
        title: "{{ symbol }} whales accumulating",
        message: "Accumulation pattern detected on {{ symbol }}. \
                  {{ tx_count }} transactions in the last {{ hours }}h. \
                  Volume: ${{ total_usd | usd }}.",
        cooldown: minutes(120),
    },
    AlertTemplate {
        kind: AlertKind::WhaleDistribution,
        default_severity: AlertSeverity::High,
        title: "{{ symbol }} whales distributing",
        message: "Distribution pattern detected on {{ symbol }}. \
                  {{ tx_count }} transactions to exchanges in the last {{ hours }}h. \
                  Volume: ${{ total_usd | usd }}. Possible selling pressure.",
        cooldown: minutes(120),
    },
    // ── Price ───────────────────────────────────────────────────────
    AlertTemplate {
        kind: AlertKind::PriceSurge,
        default_severity: AlertSeverity::Medium,
        title: "{{ symbol }} up {{ change | signed(1) }}%",
        message: "{{ symbol }} rose {{ change | signed(1) }}% over the last {{ period }}. \
                  Current price: ${{ price | usd(2) }}.",
        cooldown: minutes(60),
    },
    AlertTemplate {
        kind: AlertKind::PriceDump,
        default_severity: AlertSeverity::Medium,
        title: "{{ symbol }} down {{ change | round(1) }}%",
        message: "{{ symbol }} fell {{ change | round(1) }}% over the last {{ period }}. \
                  Current price: ${{ price | usd(2) }}.",
        cooldown: minutes(60),
    },
    // ── Volume ──────────────────────────────────────────────────────
    AlertTemplate {
        kind: AlertKind::VolumeSpike,
        default_severity: AlertSeverity::Medium,
        title: "{{ symbol }} volume {{ multiplier | round(1) }}x above average",
        message: "{{ symbol }} is trading at {{ multiplier | round(1) }}x its average volume. \
                  Volume spikes often precede price moves.",
        cooldown: minutes(60),
    },
    // ── System ──────────────────────────────────────────────────────
    AlertTemplate {
        kind: AlertKind::SystemError,
        default_severity: AlertSeverity::Critical,
        title: "Error: {{ component }}",
        message: "Component {{ component }} failed: {{ error_message }}",
        cooldown: minutes(5),
    },
    AlertTemplate {
        kind: AlertKind::SystemDataDelay,
        default_severity: AlertSeverity::Low,
        title: "Data collection delayed",
        message: "Data from {{ source }} is {{ delay_minutes }} minutes late.",
        cooldown: minutes(30),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_kind() {
        for kind in AlertKind::ALL {
            assert_eq!(AlertTemplate::for_kind(kind).kind, kind);
        }
        assert_eq!(AlertTemplate::all().len(), AlertKind::ALL.len());
    }

    #[test]
    fn score_cooldowns() {
        assert_eq!(AlertTemplate::for_kind(AlertKind::ScoreHigh).cooldown, minutes(60));
        assert_eq!(AlertTemplate::for_kind(AlertKind::ScoreCritical).cooldown, minutes(30));
        assert_eq!(AlertTemplate::for_kind(AlertKind::ScoreSpike).cooldown, minutes(30));
        assert_eq!(AlertTemplate::for_kind(AlertKind::ScoreDrop).cooldown, minutes(60));
    }

    #[test]
    fn event_cooldowns_and_severities() {
        let whale = AlertTemplate::for_kind(AlertKind::WhaleLargeTx);
        assert_eq!(whale.cooldown, minutes(5));
        assert_eq!(whale.default_severity, AlertSeverity::Medium);

        let acc = AlertTemplate::for_kind(AlertKind::WhaleAccumulation);
        assert_eq!(acc.cooldown, minutes(120));

        let sys = AlertTemplate::for_kind(AlertKind::SystemError);
        assert_eq!(sys.default_severity, AlertSeverity::Critical);
        assert_eq!(sys.cooldown, minutes(5));

        let delay = AlertTemplate::for_kind(AlertKind::SystemDataDelay);
        assert_eq!(delay.default_severity, AlertSeverity::Low);
    }
}

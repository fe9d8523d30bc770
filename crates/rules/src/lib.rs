//! Alerting side of the cryptopulse engine.
//!
//! This crate provides:
//! - YAML engine documents (`ScoringConfig`, `ThresholdConfig`) and a loader
//! - Alert kinds, severities and the immutable template table
//! - Minijinja rendering of alert titles and messages
//! - [`ThresholdMonitor`], the stateful score/event watcher with cooldowns
//!   and zone-entry hysteresis

pub mod alerts;
pub mod config;
pub mod cooldown;
pub mod monitor;
pub mod schema;
pub mod templates;

pub use alerts::{AlertCandidate, AlertKind, AlertSeverity};
pub use config::{
    CompiledThresholds, ConfigLoader, ConfigError, EngineDocuments, ScoringConfigSpec,
    ThresholdConfigSpec,
};
pub use cooldown::parse_cooldown;
pub use monitor::{MonitorStats, ThresholdMonitor, WhaleActivity, WhaleDirection, SYSTEM_SYMBOL};
pub use templates::{AlertTemplate, TemplateRenderer};

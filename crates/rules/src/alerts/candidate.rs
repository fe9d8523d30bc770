use chrono::{DateTime, Utc};
use pulse_core::Details;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AlertKind, AlertSeverity};

/// A would-be notification handed to the alert-management layer.
///
/// Candidates are never mutated after the monitor builds them; the
/// consumer decides whether to persist, deduplicate or deliver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertCandidate {
    pub id: Uuid,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    pub asset_id: String,
    pub symbol: String,
    pub context: Details,
    pub created_at: DateTime<Utc>,
}

impl AlertCandidate {
    /// Look up a numeric context field.
    pub fn context_f64(&self, key: &str) -> Option<f64> {
        self.context.get(key).and_then(|v| v.as_f64())
    }
}

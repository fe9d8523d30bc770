//! Alert value types produced by the monitor.

mod candidate;
mod kind;

pub use candidate::AlertCandidate;
pub use kind::{AlertKind, AlertSeverity};

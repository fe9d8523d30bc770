//! Document envelope shared by every engine configuration kind.

mod kind;
mod metadata;

pub use kind::ConfigKind;
pub use metadata::CommonMetadata;

use serde::Deserialize;

/// First-pass view of a YAML document: enough to dispatch on `kind`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigEnvelope {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
}

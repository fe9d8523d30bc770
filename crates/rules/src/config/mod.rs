//! YAML engine documents and the directory loader.
//!
//! Two kinds are understood: `ScoringConfig` (indicator weights, status
//! thresholds) and `ThresholdConfig` (monitor trigger levels, cooldown
//! overrides). Both follow the `apiVersion`/`kind`/`metadata`/`spec`
//! envelope and reject unknown fields.

mod error;
mod loader;
mod scoring;
mod thresholds;


pub use self::error::{ConfigError, LoadResult, LoadStatus, Result};
pub use self::loader::{load_file, parse_document, ConfigDocument, ConfigLoader, EngineDocuments};
pub use self::scoring::{IndicatorWeights, ScoringConfigRule, ScoringConfigSpec, StatusThresholds};
pub use self::thresholds::{
    CompiledThresholds, PriceThresholds, ScoreThresholds, SystemThresholds, ThresholdConfigRule,
    ThresholdConfigSpec, VolumeThresholds, WhaleThresholds,
};

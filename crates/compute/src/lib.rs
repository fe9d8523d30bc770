//! Scoring side of the cryptopulse engine.
//!
//! Raw per-asset observations ([`inputs`]) flow through the five
//! [`indicators`] into a [`CompositeScore`] built by the
//! [`ScoreAggregator`]. The [`pipeline`] scores many assets in parallel and
//! feeds the results into the alert monitor from `pulse-rules`.

pub mod aggregator;
pub mod batch;
pub mod indicators;
pub mod inputs;
pub mod pipeline;

pub use aggregator::{CompositeScore, ScoreAggregator, ScoreStatus};
pub use batch::build_pool;
pub use indicators::{
    Indicator, IndicatorError, IndicatorScore, NarrativeIndicator, NetflowIndicator,
    OpenInterestIndicator, VolumeIndicator, WhaleIndicator,
};
pub use inputs::{AssetInputs, AssetSnapshot};
pub use pipeline::{feed_monitor, ScorePipeline, TickReport};

//! Parallel scoring of many assets.
//!
//! Aggregation is pure, so assets are scored on the rayon pool with no
//! coordination. Results keep the input order.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::info;

use crate::aggregator::{CompositeScore, ScoreAggregator, ScoreStatus};
use crate::inputs::AssetSnapshot;

impl ScoreAggregator {
    /// Score every snapshot, returning composites in the same order.
    pub fn aggregate_batch(
        &self,
        snapshots: &[AssetSnapshot],
        now: DateTime<Utc>,
    ) -> Vec<CompositeScore> {
        let scores: Vec<CompositeScore> = snapshots
            .par_iter()
            .map(|s| self.aggregate(&s.symbol, &s.inputs, now))
            .collect();

        let high = scores.iter().filter(|s| s.status == ScoreStatus::High).count();
        info!("Scored {} assets ({} in high zone)", scores.len(), high);
        scores
    }
}

/// Build a rayon pool with `threads` workers; 0 means available parallelism.
pub fn build_pool(threads: usize) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("score-{}", i));
    if threads > 0 {
        builder = builder.num_threads(threads);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::{AssetInputs, NetflowInput};

    fn snapshot(symbol: &str, outflow: f64) -> AssetSnapshot {
        AssetSnapshot {
            asset_id: format!("id-{}", symbol),
            symbol: symbol.to_string(),
            price: None,
            inputs: AssetInputs {
                netflow: Some(NetflowInput {
                    inflow_usd: 1e6,
                    outflow_usd: outflow,
                    ..Default::default()
                }),
                ..Default::default()
            },
        }
    }

    #[test]
    fn batch_matches_sequential_and_keeps_order() {
        let agg = ScoreAggregator::default();
        let now = Utc::now();
        let snaps: Vec<AssetSnapshot> = (0..32)
            .map(|i| snapshot(&format!("A{}", i), i as f64 * 1e6))
            .collect();

        let pool = build_pool(4).unwrap();
        let batch = pool.install(|| agg.aggregate_batch(&snaps, now));

        assert_eq!(batch.len(), snaps.len());
        for (snap, score) in snaps.iter().zip(&batch) {
            assert_eq!(score.asset_symbol, snap.symbol);
            assert_eq!(*score, agg.aggregate(&snap.symbol, &snap.inputs, now));
        }
    }

    #[test]
    fn empty_batch() {
        assert!(ScoreAggregator::default().aggregate_batch(&[], Utc::now()).is_empty());
    }
}

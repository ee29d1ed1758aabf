//! Composite FSS score.

use crate::signals::{MeanReversionSignal, MomentumSignal};
use crate::stats;
use serde::{Deserialize, Serialize};

/// Combines the component scores into the final FSS in [0, 100].
///
/// Components that return `None` (warmup, degenerate inputs) are dropped and
/// the remaining weights renormalized. All components absent means no score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeScorer {
    pub mean_reversion: MeanReversionSignal,
    pub momentum: MomentumSignal,
    pub mean_reversion_weight: f64,
    pub momentum_weight: f64,
}

impl Default for CompositeScorer {
    fn default() -> Self {
        Self {
            mean_reversion: MeanReversionSignal::default(),
            momentum: MomentumSignal::default(),
            mean_reversion_weight: 1.0,
            momentum_weight: 1.0,
        }
    }
}

impl CompositeScorer {
    /// FSS for the last bar of the aligned close series.
    pub fn fss(&self, closes: &[f64], index_closes: &[f64]) -> Option<f64> {
        let components = [
            (self.mean_reversion.score(closes), self.mean_reversion_weight),
            (
                self.momentum.score(closes, index_closes),
                self.momentum_weight,
            ),
        ];
        combine(&components)
    }

    /// Bars of history needed before `fss` can produce a value from both
    /// components.
    pub fn warmup(&self) -> usize {
        self.mean_reversion.period.max(self.momentum.lookback + 1)
    }
}

/// Weighted average over the scored components, weights renormalized over
/// the subset that produced a value. Clipped to [0, 100].
pub fn combine(components: &[(Option<f64>, f64)]) -> Option<f64> {
    let mut total = 0.0;
    let mut weight_sum = 0.0;
    for (score, weight) in components {
        if let Some(s) = score {
            if s.is_finite() && *weight > 0.0 {
                total += s * weight;
                weight_sum += weight;
            }
        }
    }
    if weight_sum <= 0.0 {
        return None;
    }
    Some(stats::clip(total / weight_sum, 0.0, 100.0))
}

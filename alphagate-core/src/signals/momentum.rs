//! Momentum component: relative strength versus the reference index.
//!
//! The ratio close/index_close measures relative strength; its percent
//! change over `lookback` bars is scaled by 500 and centered at 50, so
//! ±10% of relative outperformance saturates the [0, 100] range.

use crate::stats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumSignal {
    pub lookback: usize,
    pub scale: f64,
}

impl Default for MomentumSignal {
    fn default() -> Self {
        Self {
            lookback: 60,
            scale: 500.0,
        }
    }
}

impl MomentumSignal {
    /// Score the last close against the aligned index series.
    ///
    /// Both slices are positionally aligned (same dates). `None` until
    /// `lookback + 1` points exist or when a ratio cannot be formed.
    pub fn score(&self, closes: &[f64], index_closes: &[f64]) -> Option<f64> {
        let n = closes.len();
        if n != index_closes.len() || n <= self.lookback {
            return None;
        }
        let then = n - 1 - self.lookback;
        let ratio_now = relative_strength(closes[n - 1], index_closes[n - 1])?;
        let ratio_then = relative_strength(closes[then], index_closes[then])?;
        if ratio_then.abs() < 1e-12 {
            return None;
        }
        let rs_change = ratio_now / ratio_then - 1.0;
        Some(50.0 + stats::clip(rs_change * self.scale, -50.0, 50.0))
    }
}

fn relative_strength(close: f64, index_close: f64) -> Option<f64> {
    if !close.is_finite() || !index_close.is_finite() || index_close <= 0.0 {
        return None;
    }
    Some(close / index_close)
}

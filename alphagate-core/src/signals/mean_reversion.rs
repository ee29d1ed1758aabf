//! Mean-reversion component: inverted Bollinger %B.
//!
//! %B locates the last close within its bands (MA ± band_width·std over
//! `period` closes). The score is (1 − %B) · 100 with %B clipped to [0, 1]:
//! oversold prices score high, overbought prices score low.

use crate::stats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanReversionSignal {
    pub period: usize,
    pub band_width: f64,
}

impl Default for MeanReversionSignal {
    fn default() -> Self {
        Self {
            period: 20,
            band_width: 2.0,
        }
    }
}

impl MeanReversionSignal {
    /// Score the last close of `closes` against its trailing band.
    ///
    /// `None` until `period` closes exist. Degenerate bands (zero width,
    /// constant prices) score neutral rather than arbitrary.
    pub fn score(&self, closes: &[f64]) -> Option<f64> {
        let n = closes.len();
        if n < self.period {
            return None;
        }
        let window = &closes[n - self.period..];
        if window.iter().any(|c| !c.is_finite()) {
            return None;
        }
        let ma = stats::mean(window);
        let sd = stats::std_dev(window);
        let upper = ma + self.band_width * sd;
        let lower = ma - self.band_width * sd;
        if upper - lower < 1e-12 {
            return Some(50.0);
        }
        let pct_b = stats::clip((closes[n - 1] - lower) / (upper - lower), 0.0, 1.0);
        Some((1.0 - pct_b) * 100.0)
    }
}

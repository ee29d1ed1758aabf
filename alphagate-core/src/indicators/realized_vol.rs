//! Annualized realized volatility.
//!
//! Sample standard deviation of daily close-to-close returns over a trailing
//! window, scaled by sqrt(252). A window of `period` returns consumes
//! `period + 1` closes, so lookback is `period`.

use crate::domain::Bar;
use crate::indicators::Indicator;
use crate::stats;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone)]
pub struct RealizedVol {
    period: usize,
    name: String,
}

impl RealizedVol {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "realized vol period must be >= 2");
        Self {
            period,
            name: format!("realized_vol_{period}"),
        }
    }
}

impl Indicator for RealizedVol {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];
        if n <= self.period {
            return result;
        }

        let mut returns = vec![f64::NAN; n];
        for i in 1..n {
            let prev = bars[i - 1].close;
            let curr = bars[i].close;
            if prev.is_nan() || curr.is_nan() || prev <= 0.0 {
                continue;
            }
            returns[i] = curr / prev - 1.0;
        }

        for i in self.period..n {
            let window = &returns[(i + 1 - self.period)..=i];
            if window.iter().any(|v| v.is_nan()) {
                continue;
            }
            result[i] = stats::std_dev(window) * TRADING_DAYS_PER_YEAR.sqrt();
        }
        result
    }
}

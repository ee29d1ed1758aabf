//! Kelly position sizing.
//!
//! Full Kelly from trailing daily returns (win rate and payoff ratio),
//! clamped to [0,1], then scaled by a fractional multiplier. With too little
//! history the sizer falls back to a deterministic FSS-proportional fraction
//! and flags the result as not estimated.

use crate::stats;
use serde::{Deserialize, Serialize};

/// Assumed average win when no winning day exists in the sample.
const DEFAULT_AVG_WIN: f64 = 0.02;
/// Assumed average loss when no losing day exists in the sample.
const DEFAULT_AVG_LOSS: f64 = 0.01;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionSizer {
    /// Fraction of full Kelly actually recommended.
    pub kelly_multiplier: f64,
    /// Return samples required before estimating Kelly from data.
    pub min_samples: usize,
    /// Cap on the FSS fallback fraction.
    pub fallback_cap: f64,
    /// Fallback fraction = (fss/100) · fallback_scale, capped.
    pub fallback_scale: f64,
}

impl Default for PositionSizer {
    fn default() -> Self {
        Self {
            kelly_multiplier: 0.25,
            min_samples: 60,
            fallback_cap: 0.15,
            fallback_scale: 0.20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KellyResult {
    pub recommended_fraction: f64,
    pub full_kelly: f64,
    pub win_rate: f64,
    pub payoff_ratio: f64,
    /// True when estimated from return history, false for the FSS fallback.
    pub estimated: bool,
}

impl PositionSizer {
    pub fn size(&self, daily_returns: &[f64], fss: f64) -> KellyResult {
        let returns: Vec<f64> = daily_returns
            .iter()
            .copied()
            .filter(|r| r.is_finite())
            .collect();

        if returns.len() < self.min_samples {
            return self.fallback(fss);
        }

        let wins: Vec<f64> = returns.iter().copied().filter(|r| *r > 0.0).collect();
        let losses: Vec<f64> = returns.iter().copied().filter(|r| *r <= 0.0).collect();

        let win_rate = wins.len() as f64 / returns.len() as f64;
        let avg_win = if wins.is_empty() {
            DEFAULT_AVG_WIN
        } else {
            stats::mean(&wins)
        };
        let avg_loss = if losses.is_empty() {
            DEFAULT_AVG_LOSS
        } else {
            stats::mean(&losses).abs().max(1e-9)
        };

        let payoff_ratio = avg_win / avg_loss;
        let full_kelly = if payoff_ratio <= 0.0 {
            0.0
        } else {
            stats::clip(
                (win_rate * payoff_ratio - (1.0 - win_rate)) / payoff_ratio,
                0.0,
                1.0,
            )
        };

        KellyResult {
            recommended_fraction: full_kelly * self.kelly_multiplier,
            full_kelly,
            win_rate,
            payoff_ratio,
            estimated: true,
        }
    }

    fn fallback(&self, fss: f64) -> KellyResult {
        let fss = stats::clip(fss, 0.0, 100.0);
        let fraction = (fss / 100.0 * self.fallback_scale).min(self.fallback_cap);
        KellyResult {
            recommended_fraction: fraction,
            full_kelly: 0.0,
            win_rate: 0.0,
            payoff_ratio: 0.0,
            estimated: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "actual={actual}, expected={expected}"
        );
    }

    #[test]
    fn known_mix_matches_hand_calc() {
        // 30 wins of +2%, 30 losses of -1%: p=0.5, b=2, f=(1.0-0.5)/2=0.25.
        let mut returns = vec![0.02; 30];
        returns.extend(vec![-0.01; 30]);
        let sizer = PositionSizer::default();
        let result = sizer.size(&returns, 60.0);
        assert!(result.estimated);
        assert_close(result.win_rate, 0.5);
        assert_close(result.payoff_ratio, 2.0);
        assert_close(result.full_kelly, 0.25);
        assert_close(result.recommended_fraction, 0.0625);
    }

    #[test]
    fn all_losses_recommend_zero() {
        let returns = vec![-0.01; 80];
        let result = PositionSizer::default().size(&returns, 90.0);
        assert!(result.estimated);
        assert_eq!(result.full_kelly, 0.0);
        assert_eq!(result.recommended_fraction, 0.0);
    }

    #[test]
    fn all_wins_saturate_at_the_multiplier() {
        let returns = vec![0.01; 80];
        let sizer = PositionSizer::default();
        let result = sizer.size(&returns, 60.0);
        assert_close(result.full_kelly, 1.0);
        assert_close(result.recommended_fraction, sizer.kelly_multiplier);
    }

    #[test]
    fn short_history_uses_fss_fallback() {
        let returns = vec![0.01; 30];
        let sizer = PositionSizer::default();

        let mid = sizer.size(&returns, 50.0);
        assert!(!mid.estimated);
        assert_close(mid.recommended_fraction, 0.10);

        // High conviction hits the fallback cap.
        let high = sizer.size(&returns, 90.0);
        assert_close(high.recommended_fraction, 0.15);
    }

    #[test]
    fn non_finite_returns_are_ignored() {
        let mut returns = vec![0.02; 30];
        returns.extend(vec![-0.01; 30]);
        returns.push(f64::NAN);
        returns.push(f64::INFINITY);
        let result = PositionSizer::default().size(&returns, 60.0);
        assert!(result.estimated);
        assert_close(result.full_kelly, 0.25);
    }

    #[test]
    fn recommendation_is_bounded() {
        let sizer = PositionSizer::default();
        for scenario in [vec![0.05; 100], vec![-0.05; 100], vec![0.0; 100]] {
            let result = sizer.size(&scenario, 100.0);
            assert!(result.recommended_fraction >= 0.0);
            assert!(result.recommended_fraction <= sizer.kelly_multiplier);
            assert!(result.recommended_fraction.is_finite());
        }
    }
}

//! Per-ticker gating and the scan-wide kill switch.
//!
//! Gating is conjunctive: a ticker is accepted only when every criterion
//! passes, and every failing criterion is recorded so a rejection explains
//! itself completely. The kill switch runs once per scan, after per-ticker
//! evaluation and before allocation, and aborts the whole scan when the
//! environment itself looks unhealthy.

use crate::domain::MarketRegime;
use serde::{Deserialize, Serialize};

/// The metric snapshot gating operates on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerMetrics {
    pub symbol: String,
    pub regime: MarketRegime,
    pub fss: f64,
    pub robustness: f64,
    pub stability: f64,
    pub kelly_fraction: f64,
    pub avg_volume: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatingPolicy {
    pub min_robustness: f64,
    pub min_stability: f64,
    pub forbidden_regimes: Vec<MarketRegime>,
    pub min_conviction: f64,
    pub min_avg_volume: f64,
}

impl Default for GatingPolicy {
    fn default() -> Self {
        Self {
            min_robustness: 0.70,
            min_stability: 0.50,
            forbidden_regimes: vec![MarketRegime::Crash, MarketRegime::BearVolatile],
            min_conviction: 55.0,
            min_avg_volume: 1_000_000.0,
        }
    }
}

/// Outcome of gating one ticker: accepted, or rejected with all reasons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatingDecision {
    pub symbol: String,
    pub accepted: bool,
    pub reasons: Vec<String>,
}

impl GatingPolicy {
    pub fn decide(&self, m: &TickerMetrics) -> GatingDecision {
        let mut reasons = Vec::new();

        if self.forbidden_regimes.contains(&m.regime) {
            reasons.push(format!("forbidden regime ({})", m.regime));
        }
        if m.robustness < self.min_robustness {
            reasons.push(format!(
                "low robustness ({:.3} < {:.2})",
                m.robustness, self.min_robustness
            ));
        }
        if m.stability < self.min_stability {
            reasons.push(format!(
                "low stability ({:.3} < {:.2})",
                m.stability, self.min_stability
            ));
        }
        if m.fss < self.min_conviction {
            reasons.push(format!(
                "weak signal ({:.1} < {:.1})",
                m.fss, self.min_conviction
            ));
        }
        if m.kelly_fraction <= 0.0 {
            reasons.push(format!("non-positive kelly ({:.4})", m.kelly_fraction));
        }
        if m.avg_volume < self.min_avg_volume {
            reasons.push(format!(
                "low liquidity (avg volume {:.0} < {:.0})",
                m.avg_volume, self.min_avg_volume
            ));
        }

        GatingDecision {
            symbol: m.symbol.clone(),
            accepted: reasons.is_empty(),
            reasons,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KillSwitch {
    pub min_data_coverage: f64,
    pub min_regime_confidence: f64,
    /// Floor on the minimum stability among accepted tickers.
    pub min_stability: f64,
    /// Floor on the minimum robustness among accepted tickers.
    pub min_robustness: f64,
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self {
            min_data_coverage: 0.80,
            min_regime_confidence: 0.50,
            min_stability: 0.60,
            min_robustness: 0.70,
        }
    }
}

impl KillSwitch {
    /// Returns the list of triggered conditions; empty means proceed.
    ///
    /// The per-ticker floors apply to the minimum among provisionally
    /// accepted tickers; with no acceptances those checks are moot (an
    /// empty book is already the no-positions outcome, not an emergency).
    pub fn check(
        &self,
        data_coverage: f64,
        regime_confidence: f64,
        accepted: &[&TickerMetrics],
    ) -> Vec<String> {
        let mut triggered = Vec::new();

        if data_coverage < self.min_data_coverage {
            triggered.push(format!(
                "data coverage {:.2} below floor {:.2}",
                data_coverage, self.min_data_coverage
            ));
        }
        if regime_confidence < self.min_regime_confidence {
            triggered.push(format!(
                "regime confidence {:.2} below floor {:.2}",
                regime_confidence, self.min_regime_confidence
            ));
        }
        if !accepted.is_empty() {
            let min_stab = accepted.iter().map(|m| m.stability).fold(f64::INFINITY, f64::min);
            if min_stab < self.min_stability {
                triggered.push(format!(
                    "minimum stability {:.3} below floor {:.2}",
                    min_stab, self.min_stability
                ));
            }
            let min_rob = accepted.iter().map(|m| m.robustness).fold(f64::INFINITY, f64::min);
            if min_rob < self.min_robustness {
                triggered.push(format!(
                    "minimum robustness {:.3} below floor {:.2}",
                    min_rob, self.min_robustness
                ));
            }
        }

        triggered
    }
}

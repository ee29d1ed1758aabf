//! Robustness evaluation: does the signal's edge generalize?
//!
//! Two orthogonal questions, two scores, both bounded [0,1] and finite for
//! every input:
//!
//! - **Regime robustness** — does the FSS/forward-return rank correlation
//!   (Spearman IC) hold up across market regimes, or is it an artifact of
//!   one environment?
//! - **Signal stability** — is the signal itself well-behaved over time
//!   (coverage, persistence, sign consistency, signal-to-noise)?

pub mod regime_score;
pub mod stability;

pub use regime_score::{regime_robustness, RegimeIc, RegimeScore, RobustnessConfig};
pub use stability::{signal_stability, StabilityBreakdown, StabilityConfig, StabilityWeights};

use crate::domain::FssRecord;
use serde::{Deserialize, Serialize};

/// Combined evaluation over one symbol's record history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RobustnessEvaluator {
    pub config: RobustnessConfig,
    pub stability: StabilityConfig,
}

/// Both scores plus per-regime diagnostics. Recomputed fresh each scan,
/// never persisted across scans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobustnessResult {
    pub regime_robustness: f64,
    pub signal_stability: f64,
    pub usable_records: usize,
    pub pooled_ic: Option<f64>,
    pub per_regime: Vec<RegimeIc>,
    pub stability_breakdown: StabilityBreakdown,
}

impl RobustnessEvaluator {
    /// Evaluate a record history. Records with undefined fields are dropped
    /// up front; ordering is restored by date so window statistics are
    /// meaningful regardless of input order.
    pub fn evaluate(&self, records: &[FssRecord]) -> RobustnessResult {
        let mut usable: Vec<&FssRecord> = records.iter().filter(|r| r.is_usable()).collect();
        usable.sort_by_key(|r| r.date);

        let regime = regime_robustness(&usable, &self.config);
        let breakdown = signal_stability(&usable, &self.stability);

        RobustnessResult {
            regime_robustness: regime.score,
            signal_stability: breakdown.rating,
            usable_records: usable.len(),
            pooled_ic: regime.pooled_ic,
            per_regime: regime.per_regime,
            stability_breakdown: breakdown,
        }
    }
}

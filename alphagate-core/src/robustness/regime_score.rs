//! Regime robustness: cross-regime consistency of the rank IC.
//!
//! Per-regime Spearman ICs are shrunk toward the pooled IC in proportion to
//! regime sample size, then combined as mean × a bounded dispersion penalty.
//! With fewer than two populated regimes the score falls back to a pooled-IC
//! mapping. Every degenerate input has an explicit finite answer.

use crate::domain::{FssRecord, MarketRegime};
use crate::stats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RobustnessConfig {
    /// Usable records below this yield the neutral score.
    pub min_records: usize,
    /// Regimes with fewer samples are excluded from the cross-regime view.
    pub min_samples_per_regime: usize,
    /// Pseudo-count for shrinking regime ICs toward the pooled IC.
    pub shrinkage_n: f64,
    /// Mean shrunk IC at or above 1/ic_scale maps to the maximum base score.
    pub ic_scale: f64,
    /// Dispersion penalty = 1/(1 + std(ICs)/dispersion_scale).
    pub dispersion_scale: f64,
    /// Single-regime mapping: base + IC·scale (capped at 1.0) for IC > 0.
    pub single_regime_base: f64,
    pub single_regime_ic_scale: f64,
    /// Single-regime score for IC <= 0.
    pub single_regime_negative: f64,
    /// Score when nothing can be estimated.
    pub neutral: f64,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            min_records: 60,
            min_samples_per_regime: 30,
            shrinkage_n: 30.0,
            ic_scale: 4.0,
            dispersion_scale: 0.10,
            single_regime_base: 0.7,
            single_regime_ic_scale: 1.5,
            single_regime_negative: 0.3,
            neutral: 0.5,
        }
    }
}

/// Per-regime IC diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeIc {
    pub regime: MarketRegime,
    pub samples: usize,
    pub ic: Option<f64>,
    pub shrunk_ic: Option<f64>,
}

/// Score plus the diagnostics behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeScore {
    pub score: f64,
    pub pooled_ic: Option<f64>,
    pub per_regime: Vec<RegimeIc>,
}

/// Compute regime robustness over usable, date-ordered records.
pub fn regime_robustness(records: &[&FssRecord], cfg: &RobustnessConfig) -> RegimeScore {
    let (fss, fwd): (Vec<f64>, Vec<f64>) = records
        .iter()
        .filter_map(|r| r.forward_return.map(|f| (r.fss, f)))
        .unzip();
    let pooled_ic = stats::spearman(&fss, &fwd);

    // Group by regime, keeping only populated groups.
    let mut groups: BTreeMap<MarketRegime, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for r in records {
        if let Some(f) = r.forward_return {
            let entry = groups.entry(r.regime).or_default();
            entry.0.push(r.fss);
            entry.1.push(f);
        }
    }
    groups.retain(|_, (f, _)| f.len() >= cfg.min_samples_per_regime);

    let per_regime: Vec<RegimeIc> = groups
        .iter()
        .map(|(regime, (f, w))| {
            let ic = stats::spearman(f, w);
            RegimeIc {
                regime: *regime,
                samples: f.len(),
                ic,
                shrunk_ic: None,
            }
        })
        .collect();

    if records.len() < cfg.min_records {
        return RegimeScore {
            score: cfg.neutral,
            pooled_ic,
            per_regime,
        };
    }

    let defined: Vec<(usize, f64)> = per_regime
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.ic.map(|ic| (i, ic)))
        .collect();

    if defined.len() < 2 {
        let score = single_regime_score(pooled_ic, cfg);
        return RegimeScore {
            score,
            pooled_ic,
            per_regime,
        };
    }

    // Shrink each regime IC toward the pooled IC by sample size.
    let target = pooled_ic.unwrap_or_else(|| {
        stats::mean(&defined.iter().map(|(_, ic)| *ic).collect::<Vec<f64>>())
    });
    let mut per_regime = per_regime;
    let mut shrunk = Vec::with_capacity(defined.len());
    for (i, ic) in &defined {
        let n = per_regime[*i].samples as f64;
        let w = n / (n + cfg.shrinkage_n);
        let s = w * ic + (1.0 - w) * target;
        per_regime[*i].shrunk_ic = Some(s);
        shrunk.push(s);
    }

    let mean_ic = stats::mean(&shrunk);
    let score = if mean_ic <= 0.0 {
        0.0
    } else {
        let base = (mean_ic * cfg.ic_scale).min(1.0);
        let penalty = 1.0 / (1.0 + stats::std_dev(&shrunk) / cfg.dispersion_scale);
        stats::clip(base * penalty, 0.0, 1.0)
    };

    RegimeScore {
        score,
        pooled_ic,
        per_regime,
    }
}

fn single_regime_score(pooled_ic: Option<f64>, cfg: &RobustnessConfig) -> f64 {
    match pooled_ic {
        None => cfg.neutral,
        Some(ic) if ic <= 0.0 => cfg.single_regime_negative,
        Some(ic) => (cfg.single_regime_base + ic * cfg.single_regime_ic_scale).min(1.0),
    }
}

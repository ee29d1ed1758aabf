//! Kelly-constrained portfolio allocation.
//!
//! Raw weight = kelly fraction × conviction (robustness and FSS tilts),
//! shrunk by a pairwise-correlation penalty, then capped per position,
//! truncated to the top-K, and renormalized to the invested fraction with a
//! bounded water-fill so the cap survives renormalization. Deterministic:
//! ties break on symbol.

use crate::stats;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// Hard cap on any single weight.
    pub max_position_pct: f64,
    /// Maximum number of positions retained.
    pub max_positions: usize,
    /// Fraction of capital deployed; the rest is a cash buffer.
    pub total_invested: f64,
    /// Pairwise |correlation| above this starts shrinking the weight.
    pub target_correlation: f64,
    /// |correlation| above this takes an extra cut.
    pub high_correlation: f64,
    /// Multiplier applied above `high_correlation`.
    pub high_correlation_cut: f64,
    /// Floor on the correlation penalty.
    pub min_penalty: f64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            max_position_pct: 0.30,
            max_positions: 10,
            total_invested: 0.95,
            target_correlation: 0.3,
            high_correlation: 0.8,
            high_correlation_cut: 0.5,
            min_penalty: 0.1,
        }
    }
}

/// One gated-in ticker, as the allocator sees it.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub symbol: String,
    pub kelly_fraction: f64,
    pub fss: f64,
    pub robustness: f64,
    /// Annualized volatility, for portfolio diagnostics.
    pub volatility: f64,
    /// Trailing daily returns for the correlation matrix.
    pub daily_returns: Vec<f64>,
}

/// Final weights plus portfolio-level diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioWeights {
    /// (symbol, weight), sorted by weight descending then symbol.
    pub weights: Vec<(String, f64)>,
    pub expected_volatility: f64,
    /// 1 − mean |pairwise correlation| over retained positions.
    pub diversification_score: f64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("no candidates to allocate")]
    NoCandidates,
    #[error("all candidate weights collapsed to zero")]
    ZeroWeight,
}

/// Allocate weights across gated-in candidates.
pub fn kelly_constrained(
    cfg: &AllocationConfig,
    candidates: &[Candidate],
) -> Result<PortfolioWeights, AllocationError> {
    if candidates.is_empty() {
        return Err(AllocationError::NoCandidates);
    }

    let corr = correlation_matrix(candidates);

    let mut raw: Vec<f64> = candidates
        .iter()
        .map(|c| {
            let conviction = (0.5 + c.robustness) * (0.5 + stats::clip(c.fss, 0.0, 100.0) / 100.0);
            c.kelly_fraction.max(0.0) * conviction
        })
        .collect();

    for (i, w) in raw.iter_mut().enumerate() {
        *w *= correlation_penalty(cfg, &corr, i);
    }

    if raw.iter().sum::<f64>() <= 0.0 {
        return Err(AllocationError::ZeroWeight);
    }

    // Top-K by raw weight, symbol as the deterministic tie-break.
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        raw[b]
            .partial_cmp(&raw[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| candidates[a].symbol.cmp(&candidates[b].symbol))
    });
    order.truncate(cfg.max_positions);

    let selected_raw: Vec<f64> = order.iter().map(|&i| raw[i]).collect();
    let weights = water_fill(cfg, &selected_raw);

    let mut named: Vec<(usize, f64)> = order.iter().copied().zip(weights).collect();
    named.retain(|(_, w)| *w > 0.0);
    if named.is_empty() {
        return Err(AllocationError::ZeroWeight);
    }

    let (expected_volatility, diversification_score) =
        diagnostics(candidates, &corr, &named);

    let weights = named
        .into_iter()
        .map(|(i, w)| (candidates[i].symbol.clone(), w))
        .collect();

    Ok(PortfolioWeights {
        weights,
        expected_volatility,
        diversification_score,
    })
}

/// Proportional allocation with a per-position cap, iterated until no weight
/// violates the cap. Terminates in at most `raw.len()` passes since each
/// pass permanently caps at least one position.
fn water_fill(cfg: &AllocationConfig, raw: &[f64]) -> Vec<f64> {
    let k = raw.len();
    let cap = cfg.max_position_pct;
    let target = cfg.total_invested.min(cap * k as f64);

    let mut weights = vec![0.0; k];
    let mut capped = vec![false; k];

    for _ in 0..=k {
        let fixed: f64 = capped.iter().filter(|c| **c).count() as f64 * cap;
        let remaining = (target - fixed).max(0.0);
        let free_raw: f64 = raw
            .iter()
            .zip(&capped)
            .filter(|(_, c)| !**c)
            .map(|(r, _)| *r)
            .sum();
        if free_raw <= 0.0 {
            break;
        }

        let mut violated = false;
        for i in 0..k {
            if capped[i] {
                weights[i] = cap;
            } else {
                weights[i] = raw[i] / free_raw * remaining;
                if weights[i] > cap + 1e-12 {
                    capped[i] = true;
                    violated = true;
                }
            }
        }
        if !violated {
            break;
        }
    }

    for w in &mut weights {
        *w = w.min(cap);
    }
    weights
}

fn correlation_penalty(cfg: &AllocationConfig, corr: &[Vec<f64>], i: usize) -> f64 {
    let max_corr = corr[i]
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != i)
        .map(|(_, c)| c.abs())
        .fold(0.0, f64::max);

    if max_corr <= cfg.target_correlation {
        return 1.0;
    }
    let mut penalty =
        1.0 - (max_corr - cfg.target_correlation) / (1.0 - cfg.target_correlation);
    if max_corr > cfg.high_correlation {
        penalty *= cfg.high_correlation_cut;
    }
    penalty.max(cfg.min_penalty)
}

/// Pairwise Pearson over the overlapping return tails. Pairs with too little
/// overlap (or degenerate variance) count as uncorrelated.
fn correlation_matrix(candidates: &[Candidate]) -> Vec<Vec<f64>> {
    let n = candidates.len();
    let mut corr = vec![vec![0.0; n]; n];
    for i in 0..n {
        corr[i][i] = 1.0;
        for j in (i + 1)..n {
            let a = &candidates[i].daily_returns;
            let b = &candidates[j].daily_returns;
            let overlap = a.len().min(b.len());
            let value = if overlap < 3 {
                0.0
            } else {
                stats::pearson(&a[a.len() - overlap..], &b[b.len() - overlap..]).unwrap_or(0.0)
            };
            corr[i][j] = value;
            corr[j][i] = value;
        }
    }
    corr
}

fn diagnostics(
    candidates: &[Candidate],
    corr: &[Vec<f64>],
    named: &[(usize, f64)],
) -> (f64, f64) {
    let mut variance = 0.0;
    for (i, wi) in named {
        for (j, wj) in named {
            let vi = candidates[*i].volatility.max(0.0);
            let vj = candidates[*j].volatility.max(0.0);
            variance += wi * wj * vi * vj * corr[*i][*j];
        }
    }
    let expected_volatility = variance.max(0.0).sqrt();

    let diversification = if named.len() < 2 {
        1.0
    } else {
        let mut total = 0.0;
        let mut pairs = 0usize;
        for (a, (i, _)) in named.iter().enumerate() {
            for (j, _) in named.iter().skip(a + 1) {
                total += corr[*i][*j].abs();
                pairs += 1;
            }
        }
        stats::clip(1.0 - total / pairs as f64, 0.0, 1.0)
    };

    (expected_volatility, diversification)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(symbol: &str, kelly: f64, returns: Vec<f64>) -> Candidate {
        Candidate {
            symbol: symbol.into(),
            kelly_fraction: kelly,
            fss: 60.0,
            robustness: 0.8,
            volatility: 0.20,
            daily_returns: returns,
        }
    }

    /// Square wave of the given half-period. Waves with distinct power-of-two
    /// half-periods are mutually orthogonal over a multiple of their common
    /// period, giving exactly-zero pairwise correlations.
    fn square_wave(n: usize, half_period: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                if (i / half_period) % 2 == 0 {
                    0.01
                } else {
                    -0.01
                }
            })
            .collect()
    }

    fn alternating(n: usize) -> Vec<f64> {
        square_wave(n, 1)
    }

    fn blocky(n: usize) -> Vec<f64> {
        square_wave(n, 2)
    }

    #[test]
    fn empty_candidates_is_an_error() {
        let result = kelly_constrained(&AllocationConfig::default(), &[]);
        assert_eq!(result.unwrap_err(), AllocationError::NoCandidates);
    }

    #[test]
    fn zero_kelly_everywhere_is_an_error() {
        let candidates = vec![
            candidate("AAA", 0.0, alternating(60)),
            candidate("BBB", 0.0, blocky(60)),
        ];
        let result = kelly_constrained(&AllocationConfig::default(), &candidates);
        assert_eq!(result.unwrap_err(), AllocationError::ZeroWeight);
    }

    #[test]
    fn single_candidate_gets_the_cap() {
        let cfg = AllocationConfig::default();
        let result = kelly_constrained(&cfg, &[candidate("AAA", 0.1, alternating(60))]).unwrap();
        assert_eq!(result.weights.len(), 1);
        let (symbol, weight) = &result.weights[0];
        assert_eq!(symbol, "AAA");
        assert!((weight - cfg.max_position_pct).abs() < 1e-12);
        assert_eq!(result.diversification_score, 1.0);
    }

    #[test]
    fn no_weight_exceeds_the_cap_and_sum_is_bounded() {
        let cfg = AllocationConfig::default();
        let candidates: Vec<Candidate> = (0..6)
            .map(|i| {
                let returns = if i % 2 == 0 {
                    alternating(60)
                } else {
                    blocky(60)
                };
                candidate(&format!("SYM{i}"), 0.02 + 0.03 * i as f64, returns)
            })
            .collect();
        let result = kelly_constrained(&cfg, &candidates).unwrap();
        let sum: f64 = result.weights.iter().map(|(_, w)| w).sum();
        assert!(sum <= cfg.total_invested + 1e-9, "sum {sum}");
        for (symbol, w) in &result.weights {
            assert!(
                *w <= cfg.max_position_pct + 1e-9,
                "{symbol} weight {w} over cap"
            );
            assert!(*w > 0.0);
        }
    }

    #[test]
    fn top_k_truncation_applies() {
        let cfg = AllocationConfig {
            max_positions: 3,
            ..AllocationConfig::default()
        };
        let candidates: Vec<Candidate> = (0..8)
            .map(|i| candidate(&format!("SYM{i}"), 0.01 + 0.01 * i as f64, alternating(60)))
            .collect();
        let result = kelly_constrained(&cfg, &candidates).unwrap();
        assert_eq!(result.weights.len(), 3);
        // Highest kelly candidates survive.
        let symbols: Vec<&str> = result.weights.iter().map(|(s, _)| s.as_str()).collect();
        assert!(symbols.contains(&"SYM7"));
        assert!(symbols.contains(&"SYM6"));
        assert!(symbols.contains(&"SYM5"));
    }

    #[test]
    fn higher_conviction_earns_more_weight() {
        let cfg = AllocationConfig::default();
        // Mutually orthogonal return streams: no correlation penalties.
        let mut low = candidate("LOW", 0.05, square_wave(64, 1));
        low.robustness = 0.72;
        let mut high = candidate("HIGH", 0.05, square_wave(64, 2));
        high.robustness = 0.95;
        // Two fillers so the cap does not flatten the comparison.
        let mut fill_a = candidate("FILLA", 0.05, square_wave(64, 4));
        fill_a.robustness = 0.72;
        let mut fill_b = candidate("FILLB", 0.05, square_wave(64, 8));
        fill_b.robustness = 0.72;

        let result = kelly_constrained(&cfg, &[low, high, fill_a, fill_b]).unwrap();
        let weight_of = |name: &str| {
            result
                .weights
                .iter()
                .find(|(s, _)| s == name)
                .map(|(_, w)| *w)
                .unwrap()
        };
        assert!(weight_of("HIGH") > weight_of("LOW"));
    }

    #[test]
    fn correlated_pair_is_penalized() {
        // Keep the invested total low enough that the cap does not flatten
        // the penalized and unpenalized weights together.
        let cfg = AllocationConfig {
            total_invested: 0.5,
            ..AllocationConfig::default()
        };
        let twin_a = candidate("TWINA", 0.05, alternating(60));
        let twin_b = candidate("TWINB", 0.05, alternating(60));
        let loner = candidate("LONER", 0.05, blocky(60));
        let result = kelly_constrained(&cfg, &[twin_a, twin_b, loner]).unwrap();
        let weight_of = |name: &str| {
            result
                .weights
                .iter()
                .find(|(s, _)| s == name)
                .map(|(_, w)| *w)
                .unwrap()
        };
        assert!(
            weight_of("LONER") > weight_of("TWINA"),
            "uncorrelated candidate should out-weigh a perfect twin"
        );
        assert!(result.diversification_score < 1.0);
    }

    #[test]
    fn result_is_deterministic() {
        let cfg = AllocationConfig::default();
        let candidates = vec![
            candidate("AAA", 0.05, alternating(60)),
            candidate("BBB", 0.05, alternating(60)),
            candidate("CCC", 0.05, blocky(60)),
        ];
        let a = kelly_constrained(&cfg, &candidates).unwrap();
        let b = kelly_constrained(&cfg, &candidates).unwrap();
        assert_eq!(a.weights, b.weights);
    }

    #[test]
    fn diagnostics_are_finite() {
        let cfg = AllocationConfig::default();
        let result = kelly_constrained(
            &cfg,
            &[
                candidate("AAA", 0.05, alternating(60)),
                candidate("BBB", 0.04, blocky(60)),
            ],
        )
        .unwrap();
        assert!(result.expected_volatility.is_finite());
        assert!(result.expected_volatility >= 0.0);
        assert!((0.0..=1.0).contains(&result.diversification_score));
    }
}

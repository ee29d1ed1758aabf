//! Signal Stability Rating: temporal health of the signal itself.
//!
//! Four sub-scores, each in [0,1] with an explicit degenerate fallback,
//! combined as a weighted sum:
//!
//! - coverage: how much history backs the estimate
//! - persistence: lag-1 autocorrelation of the FSS series
//! - sign stability: consistency of per-window IC signs
//! - signal-to-noise: |mean| / std of per-window ICs, squashed to [0,1)

use crate::domain::FssRecord;
use crate::stats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityWeights {
    pub coverage: f64,
    pub persistence: f64,
    pub sign_stability: f64,
    pub snr: f64,
}

impl Default for StabilityWeights {
    fn default() -> Self {
        Self {
            coverage: 0.25,
            persistence: 0.25,
            sign_stability: 0.25,
            snr: 0.25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// Usable records below this yield the neutral rating.
    pub min_records: usize,
    /// Record count at which coverage saturates.
    pub target_records: usize,
    /// Records per IC window.
    pub window: usize,
    pub weights: StabilityWeights,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            min_records: 60,
            target_records: 100,
            window: 30,
            weights: StabilityWeights::default(),
        }
    }
}

/// Sub-scores and the final rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilityBreakdown {
    pub coverage: f64,
    pub persistence: f64,
    pub sign_stability: f64,
    pub snr: f64,
    pub rating: f64,
}

impl StabilityBreakdown {
    fn neutral() -> Self {
        Self {
            coverage: 0.5,
            persistence: 0.5,
            sign_stability: 0.5,
            snr: 0.5,
            rating: 0.5,
        }
    }
}

/// Compute the SSR over usable, date-ordered records.
pub fn signal_stability(records: &[&FssRecord], cfg: &StabilityConfig) -> StabilityBreakdown {
    let n = records.len();
    if n < cfg.min_records {
        return StabilityBreakdown::neutral();
    }

    let fss: Vec<f64> = records.iter().map(|r| r.fss).collect();
    let window_ics = window_ics(records, cfg.window);

    let coverage = (n as f64 / cfg.target_records as f64).min(1.0);

    let persistence = match stats::autocorr_lag1(&fss) {
        Some(ac) => stats::clip((ac + 1.0) / 2.0, 0.0, 1.0),
        None => 0.5,
    };

    let sign_stability = sign_stability_score(&window_ics);
    let snr = snr_score(&window_ics);

    let w = &cfg.weights;
    let weight_sum = w.coverage + w.persistence + w.sign_stability + w.snr;
    let rating = if weight_sum <= 0.0 {
        0.5
    } else {
        stats::clip(
            (coverage * w.coverage
                + persistence * w.persistence
                + sign_stability * w.sign_stability
                + snr * w.snr)
                / weight_sum,
            0.0,
            1.0,
        )
    };

    StabilityBreakdown {
        coverage,
        persistence,
        sign_stability,
        snr,
        rating,
    }
}

/// Spearman IC per non-overlapping window; undefined ICs are skipped.
fn window_ics(records: &[&FssRecord], window: usize) -> Vec<f64> {
    if window < 3 {
        return Vec::new();
    }
    records
        .chunks_exact(window)
        .filter_map(|chunk| {
            let (f, w): (Vec<f64>, Vec<f64>) = chunk
                .iter()
                .filter_map(|r| r.forward_return.map(|fr| (r.fss, fr)))
                .unzip();
            stats::spearman(&f, &w)
        })
        .collect()
}

fn sign_stability_score(ics: &[f64]) -> f64 {
    if ics.len() < 2 {
        return 0.5;
    }
    let flips = ics
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count();
    1.0 - flips as f64 / (ics.len() - 1) as f64
}

fn snr_score(ics: &[f64]) -> f64 {
    if ics.len() < 2 {
        return 0.5;
    }
    let sd = stats::std_dev(ics);
    if sd < 1e-12 {
        return 1.0;
    }
    let snr = stats::mean(ics).abs() / sd;
    snr / (1.0 + snr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MarketRegime;
    use chrono::NaiveDate;

    fn make_records(fss: &[f64], fwd: &[f64]) -> Vec<FssRecord> {
        let base = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        fss.iter()
            .zip(fwd.iter())
            .enumerate()
            .map(|(i, (&f, &w))| FssRecord {
                symbol: "TEST".into(),
                date: base + chrono::Duration::days(i as i64),
                fss: f,
                regime: MarketRegime::Neutral,
                forward_return: Some(w),
            })
            .collect()
    }

    fn rate(records: &[FssRecord], cfg: &StabilityConfig) -> StabilityBreakdown {
        let refs: Vec<&FssRecord> = records.iter().collect();
        signal_stability(&refs, cfg)
    }

    /// Strictly increasing fss and fwd: every sub-score except coverage
    /// saturates, isolating the coverage term.
    fn monotone_records(n: usize) -> Vec<FssRecord> {
        let fss: Vec<f64> = (0..n).map(|i| 40.0 + i as f64 * 0.1).collect();
        let fwd: Vec<f64> = (0..n).map(|i| 0.01 + i as f64 * 0.0001).collect();
        make_records(&fss, &fwd)
    }

    #[test]
    fn short_history_is_exactly_neutral() {
        let cfg = StabilityConfig::default();
        let breakdown = rate(&monotone_records(59), &cfg);
        assert_eq!(breakdown.rating, 0.5);
    }

    #[test]
    fn longer_history_scores_strictly_higher_coverage() {
        let cfg = StabilityConfig::default();
        let short = rate(&monotone_records(60), &cfg);
        let long = rate(&monotone_records(150), &cfg);
        assert!((short.coverage - 0.6).abs() < 1e-12);
        assert!((long.coverage - 1.0).abs() < 1e-12);
        // Other sub-scores saturate identically for monotone data.
        assert!((short.persistence - long.persistence).abs() < 1e-9);
        assert_eq!(short.sign_stability, long.sign_stability);
        assert_eq!(short.snr, long.snr);
        assert!(short.rating < long.rating);
    }

    #[test]
    fn trending_signal_is_more_persistent_than_oscillation() {
        let cfg = StabilityConfig::default();
        let trending = rate(&monotone_records(120), &cfg);

        // An anti-persistent oscillator: lag-1 autocorrelation is -1.
        let fss: Vec<f64> = (0..120)
            .map(|i| if i % 2 == 0 { 50.0 } else { 60.0 })
            .collect();
        let fwd: Vec<f64> = (0..120).map(|i| 0.01 + (i % 7) as f64 * 0.001).collect();
        let oscillating = rate(&make_records(&fss, &fwd), &cfg);

        assert!(
            trending.persistence > oscillating.persistence,
            "trending {} should beat oscillation {}",
            trending.persistence,
            oscillating.persistence
        );
        assert!(oscillating.persistence < 0.1);
    }

    #[test]
    fn alternating_window_ics_destroy_sign_stability() {
        let cfg = StabilityConfig::default();
        let n = 150;
        let w = cfg.window;
        let fss: Vec<f64> = (0..n).map(|i| 40.0 + i as f64 * 0.1).collect();
        // fwd rises within even windows, falls within odd ones: per-window
        // ICs alternate +1, -1.
        let fwd: Vec<f64> = (0..n)
            .map(|i| {
                let pos = i % w;
                let dir = if (i / w) % 2 == 0 { pos } else { w - 1 - pos };
                0.01 + dir as f64 * 0.0001
            })
            .collect();
        let breakdown = rate(&make_records(&fss, &fwd), &cfg);
        assert_eq!(breakdown.sign_stability, 0.0);

        let stable = rate(&monotone_records(150), &cfg);
        assert_eq!(stable.sign_stability, 1.0);
    }

    #[test]
    fn consistent_window_ics_have_maximal_snr() {
        let cfg = StabilityConfig::default();
        // Every window has IC exactly 1.0: zero dispersion.
        let breakdown = rate(&monotone_records(150), &cfg);
        assert_eq!(breakdown.snr, 1.0);
    }

    #[test]
    fn constant_fss_has_neutral_persistence() {
        let cfg = StabilityConfig::default();
        let fss = vec![55.0; 100];
        let fwd: Vec<f64> = (0..100).map(|i| 0.01 + i as f64 * 0.0001).collect();
        let breakdown = rate(&make_records(&fss, &fwd), &cfg);
        assert_eq!(breakdown.persistence, 0.5);
        assert!(breakdown.rating.is_finite());
        assert!((0.0..=1.0).contains(&breakdown.rating));
    }

    #[test]
    fn rating_is_bounded_for_degenerate_inputs() {
        let cfg = StabilityConfig::default();
        // All-identical records: constant fss, constant fwd.
        let breakdown = rate(&make_records(&[50.0; 80], &[0.0; 80]), &cfg);
        assert!(breakdown.rating.is_finite());
        assert!((0.0..=1.0).contains(&breakdown.rating));
    }
}

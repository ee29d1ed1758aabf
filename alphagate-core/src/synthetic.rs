//! Synthetic market data for tests, benches, and offline experiments.
//!
//! Seeded geometric random walks with uniform shocks: not a market model,
//! just deterministic fixtures with controllable drift and volatility.

use crate::domain::{Bar, FssRecord, MarketRegime};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const BASE_DATE: (i32, u32, u32) = (2022, 1, 3);

/// One phase of a generated price path.
#[derive(Debug, Clone, Copy)]
pub struct Phase {
    pub bars: usize,
    /// Mean daily return.
    pub drift: f64,
    /// Half-width of the uniform daily shock.
    pub shock: f64,
}

/// Generate a bar series from consecutive phases.
///
/// Same seed, same series. Dates are consecutive calendar days starting at
/// a fixed base date so multi-symbol fixtures align positionally.
pub fn phased_bars(symbol: &str, phases: &[Phase], seed: u64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let base = NaiveDate::from_ymd_opt(BASE_DATE.0, BASE_DATE.1, BASE_DATE.2)
        .unwrap_or_default();

    let mut bars = Vec::new();
    let mut price: f64 = 100.0;
    let mut day = 0i64;

    for phase in phases {
        for _ in 0..phase.bars {
            let shock = rng.gen_range(-phase.shock..=phase.shock);
            let prev = price;
            price *= 1.0 + phase.drift + shock;
            price = price.max(0.01);

            let open = prev;
            let high = open.max(price) * 1.002;
            let low = open.min(price) * 0.998;
            bars.push(Bar {
                symbol: symbol.to_string(),
                date: base + chrono::Duration::days(day),
                open,
                high,
                low,
                close: price,
                volume: rng.gen_range(1_500_000..5_000_000),
            });
            day += 1;
        }
    }
    bars
}

/// A steady drifting series: one phase.
pub fn trending_bars(symbol: &str, bars: usize, drift: f64, shock: f64, seed: u64) -> Vec<Bar> {
    phased_bars(symbol, &[Phase { bars, drift, shock }], seed)
}

/// An index path that spends its first half in a quiet uptrend and its
/// second half in a volatile downtrend.
pub fn two_regime_index(symbol: &str, bars_per_phase: usize, seed: u64) -> Vec<Bar> {
    phased_bars(
        symbol,
        &[
            Phase {
                bars: bars_per_phase,
                drift: 0.0008,
                shock: 0.004,
            },
            Phase {
                bars: bars_per_phase,
                drift: -0.002,
                shock: 0.035,
            },
        ],
        seed,
    )
}

/// Synthetic record history with a controllable rank correlation between
/// the score and the forward return, split evenly across `regimes`.
///
/// Within each regime block the forward-return ranks are the score ranks
/// cyclically shifted, which pins the Spearman IC to exactly
/// 1 − 6·shift·(m − shift)/(m² − 1) for block size m.
pub fn correlated_records(
    symbol: &str,
    per_regime: usize,
    regimes: &[MarketRegime],
    shift: usize,
) -> Vec<FssRecord> {
    let base = NaiveDate::from_ymd_opt(BASE_DATE.0, BASE_DATE.1, BASE_DATE.2)
        .unwrap_or_default();
    let mut records = Vec::with_capacity(per_regime * regimes.len());
    let mut day = 0i64;

    for (block, regime) in regimes.iter().enumerate() {
        let fss_offset = 40.0 + block as f64 * 15.0;
        let fwd_offset = block as f64 * 1e-4;
        for i in 0..per_regime {
            records.push(FssRecord {
                symbol: symbol.to_string(),
                date: base + chrono::Duration::days(day),
                fss: fss_offset + i as f64 * 0.1,
                regime: *regime,
                forward_return: Some(
                    fwd_offset + ((i + shift) % per_regime.max(1)) as f64 * 0.001,
                ),
            });
            day += 1;
        }
    }
    records
}

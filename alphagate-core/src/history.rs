//! FSS history construction: one record per evaluation date.
//!
//! Walks the aligned (symbol, index) bar series and emits, for each date past
//! warmup, the composite score, the index regime as of that date, and the
//! realized forward return where the horizon has elapsed. Records near the
//! series end carry `forward_return: None` and are excluded from IC
//! estimation by `FssRecord::is_usable`.

use crate::domain::{Bar, FssRecord};
use crate::regime;
use crate::signals::CompositeScorer;
use serde::{Deserialize, Serialize};

/// Hard floor on trailing bars before any record is emitted.
pub const HARD_FLOOR: usize = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryBuilder {
    pub scorer: CompositeScorer,
    /// Trailing bars required before the first record (>= HARD_FLOOR).
    pub min_history: usize,
    /// Forward-return horizon in bars.
    pub forward_horizon: usize,
}

impl Default for HistoryBuilder {
    fn default() -> Self {
        Self {
            scorer: CompositeScorer::default(),
            min_history: 200,
            forward_horizon: 21,
        }
    }
}

impl HistoryBuilder {
    /// Build the record series for one symbol.
    ///
    /// `bars` and `index_bars` must be positionally aligned on dates; a
    /// length mismatch yields no records (the caller validates alignment).
    pub fn build(&self, bars: &[Bar], index_bars: &[Bar]) -> Vec<FssRecord> {
        let n = bars.len();
        if n != index_bars.len() || n == 0 {
            return Vec::new();
        }
        let start = self
            .min_history
            .max(HARD_FLOOR)
            .max(self.scorer.warmup());
        if n < start {
            return Vec::new();
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let index_closes: Vec<f64> = index_bars.iter().map(|b| b.close).collect();
        let regimes = regime::classify_series(index_bars);

        let mut records = Vec::with_capacity(n - start + 1);
        for i in (start - 1)..n {
            let Some(fss) = self.scorer.fss(&closes[..=i], &index_closes[..=i]) else {
                continue;
            };
            let forward_return = self.forward_return(&closes, i);
            records.push(FssRecord {
                symbol: bars[i].symbol.clone(),
                date: bars[i].date,
                fss,
                regime: regimes[i],
                forward_return,
            });
        }
        records
    }

    fn forward_return(&self, closes: &[f64], i: usize) -> Option<f64> {
        let j = i + self.forward_horizon;
        if j >= closes.len() {
            return None;
        }
        let (now, later) = (closes[i], closes[j]);
        if !now.is_finite() || !later.is_finite() || now <= 0.0 {
            return None;
        }
        Some(later / now - 1.0)
    }
}

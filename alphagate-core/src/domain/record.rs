//! FSS history records: the raw material for robustness evaluation.

use crate::domain::MarketRegime;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One historical observation: the composite signal score on a date, the
/// prevailing regime, and the realized forward return (absent near the end
/// of the series where the horizon has not elapsed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FssRecord {
    pub symbol: String,
    pub date: NaiveDate,
    pub fss: f64,
    pub regime: MarketRegime,
    pub forward_return: Option<f64>,
}

impl FssRecord {
    /// A record is usable for IC estimation only when both the score and the
    /// forward return are present and finite.
    pub fn is_usable(&self) -> bool {
        self.fss.is_finite()
            && self
                .forward_return
                .map(|r| r.is_finite())
                .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fss: f64, fwd: Option<f64>) -> FssRecord {
        FssRecord {
            symbol: "TEST".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            fss,
            regime: MarketRegime::Neutral,
            forward_return: fwd,
        }
    }

    #[test]
    fn usable_requires_forward_return() {
        assert!(record(55.0, Some(0.01)).is_usable());
        assert!(!record(55.0, None).is_usable());
    }

    #[test]
    fn usable_requires_finite_values() {
        assert!(!record(f64::NAN, Some(0.01)).is_usable());
        assert!(!record(55.0, Some(f64::INFINITY)).is_usable());
    }
}

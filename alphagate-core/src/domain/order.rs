//! Executable order produced at the end of a scan.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A sized buy order. Share counts are whole (floor of capital × weight /
/// price); the limit price carries a small offset above the reference close.
/// The metric snapshot travels with the order so the fill report is
/// auditable without replaying the scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub symbol: String,
    pub date: NaiveDate,
    pub shares: u64,
    pub limit_price: f64,
    pub weight: f64,
    pub notional: f64,
    pub fss: f64,
    pub robustness: f64,
    pub stability: f64,
    pub kelly_fraction: f64,
}

impl Order {
    /// Orders that round down to zero shares are never emitted.
    pub fn is_executable(&self) -> bool {
        self.shares > 0 && self.limit_price > 0.0
    }
}

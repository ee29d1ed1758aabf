//! Order construction and CSV export.
//!
//! Portfolio weights become whole-share limit orders. Shares round down,
//! so small weights can produce zero shares; those orders are dropped
//! rather than emitted.

use alphagate_core::domain::Order;
use alphagate_core::gating::TickerMetrics;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderConfig {
    /// Limit placed this fraction above the last close.
    pub limit_offset: f64,
    /// Weights below this are not worth an order.
    pub min_weight: f64,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            limit_offset: 0.005,
            min_weight: 0.01,
        }
    }
}

/// Turn one portfolio weight into a limit order, or nothing if the weight
/// is below the floor or rounds to zero shares.
pub fn build_order(
    config: &OrderConfig,
    capital: f64,
    date: NaiveDate,
    weight: f64,
    last_close: f64,
    metrics: &TickerMetrics,
) -> Option<Order> {
    if weight < config.min_weight || !(last_close > 0.0) {
        return None;
    }
    // Shares divide the allocated dollars by the reference close; the limit
    // offset is execution headroom on top, not part of sizing.
    let limit_price = last_close * (1.0 + config.limit_offset);
    let shares = (capital * weight / last_close).floor() as u64;
    if shares == 0 {
        return None;
    }
    Some(Order {
        symbol: metrics.symbol.clone(),
        date,
        shares,
        limit_price,
        weight,
        notional: shares as f64 * last_close,
        fss: metrics.fss,
        robustness: metrics.robustness,
        stability: metrics.stability,
        kelly_fraction: metrics.kelly_fraction,
    })
}

/// Write orders as CSV with a header row.
pub fn write_csv(path: &Path, orders: &[Order]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    for order in orders {
        writer.serialize(order)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read an order CSV back (used by reporting and tests).
pub fn read_csv(path: &Path) -> Result<Vec<Order>, csv::Error> {
    let mut reader = csv::Reader::from_path(path)?;
    reader.deserialize::<Order>().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphagate_core::domain::MarketRegime;
    use tempfile::tempdir;

    fn metrics(symbol: &str) -> TickerMetrics {
        TickerMetrics {
            symbol: symbol.into(),
            regime: MarketRegime::BullQuiet,
            fss: 62.0,
            robustness: 0.8,
            stability: 0.7,
            kelly_fraction: 0.05,
            avg_volume: 2_000_000.0,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    #[test]
    fn shares_round_down_and_notional_matches() {
        let config = OrderConfig::default();
        let order = build_order(&config, 100_000.0, date(), 0.20, 150.0, &metrics("AAPL")).unwrap();
        // Sized on the close, not the offset limit: 20_000 / 150 = 133.33
        // -> 133 shares (dividing by 150.75 would lose one).
        assert_eq!(order.shares, 133);
        assert!((order.limit_price - 150.75).abs() < 1e-9);
        assert!((order.notional - 133.0 * 150.0).abs() < 1e-9);
        assert!(order.is_executable());
    }

    #[test]
    fn dust_weight_produces_no_order() {
        let config = OrderConfig::default();
        assert!(build_order(&config, 100_000.0, date(), 0.005, 150.0, &metrics("AAPL")).is_none());
    }

    #[test]
    fn zero_share_rounding_produces_no_order() {
        let config = OrderConfig::default();
        // 1% of 10k = 100, below one 150-dollar share.
        assert!(build_order(&config, 10_000.0, date(), 0.01, 150.0, &metrics("AAPL")).is_none());
    }

    #[test]
    fn csv_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        let config = OrderConfig::default();
        let orders: Vec<Order> = [("AAPL", 0.25), ("MSFT", 0.15)]
            .iter()
            .filter_map(|(s, w)| build_order(&config, 100_000.0, date(), *w, 200.0, &metrics(s)))
            .collect();
        assert_eq!(orders.len(), 2);

        write_csv(&path, &orders).unwrap();
        let back = read_csv(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].symbol, "AAPL");
        assert_eq!(back[0].shares, orders[0].shares);
        assert_eq!(back[1].date, date());
    }
}

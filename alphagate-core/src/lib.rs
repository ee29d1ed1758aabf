//! AlphaGate Core — signal robustness and portfolio allocation engine.
//!
//! This crate contains the pure computation layer:
//! - Domain types (bars, regimes, FSS records, orders)
//! - Rolling indicators (SMA, rolling std, realized volatility)
//! - Market regime classification from a reference index
//! - FSS signal components and the composite score
//! - History builder (score / regime / forward-return records)
//! - Robustness evaluation (regime robustness + signal stability)
//! - Kelly position sizing
//! - Gating policy and scan-wide kill switch
//! - Kelly-constrained portfolio allocation
//!
//! No I/O happens here; orchestration lives in `alphagate-runner`.

pub mod allocation;
pub mod domain;
pub mod gating;
pub mod history;
pub mod indicators;
pub mod regime;
pub mod robustness;
pub mod signals;
pub mod sizing;
pub mod stats;
pub mod synthetic;

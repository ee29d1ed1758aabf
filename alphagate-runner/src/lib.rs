//! AlphaGate scan runner.
//!
//! Orchestration layer on top of `alphagate-core`:
//! - `config`: TOML scan configuration with a content-addressable scan ID
//! - `ingest`: CSV bar loading and index alignment
//! - `scan`: the full evaluate / gate / kill-switch / allocate / size cycle
//! - `decision_log`: append-only JSONL audit trail
//! - `orders`: weight-to-shares sizing and CSV export

pub mod config;
pub mod decision_log;
pub mod ingest;
pub mod orders;
pub mod scan;

pub use config::{ConfigError, ScanConfig, ScanId};
pub use decision_log::{Decision, DecisionEntry, DecisionLog, MetricsSnapshot};
pub use ingest::{load_universe, IngestError, UniverseData};
pub use orders::OrderConfig;
pub use scan::{run_scan, ScanReport, ScanStatus};

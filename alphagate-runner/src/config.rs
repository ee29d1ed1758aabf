//! Serializable scan configuration.
//!
//! One TOML file captures everything needed to reproduce a scan: the
//! universe, the signal/history parameters, robustness and gating
//! thresholds, and allocation limits. The blake3 hash of the serialized
//! config is the scan's content-addressable identity.

use alphagate_core::allocation::AllocationConfig;
use alphagate_core::gating::{GatingPolicy, KillSwitch};
use alphagate_core::history::HistoryBuilder;
use alphagate_core::robustness::RobustnessEvaluator;
use alphagate_core::sizing::PositionSizer;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::orders::OrderConfig;

/// Unique identifier for a scan (content-addressable hash).
pub type ScanId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Symbols to evaluate.
    pub universe: Vec<String>,

    /// Reference index symbol (regime classification, relative strength).
    pub index_symbol: String,

    /// Capital available for deployment.
    pub capital: f64,

    /// Worker threads for per-ticker evaluation.
    pub workers: usize,

    pub history: HistoryBuilder,
    pub evaluator: RobustnessEvaluator,
    pub sizer: PositionSizer,
    pub gating: GatingPolicy,
    pub kill_switch: KillSwitch,
    pub allocation: AllocationConfig,
    pub orders: OrderConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            universe: Vec::new(),
            index_symbol: "SPY".to_string(),
            capital: 100_000.0,
            workers: 4,
            history: HistoryBuilder::default(),
            evaluator: RobustnessEvaluator::default(),
            sizer: PositionSizer::default(),
            gating: GatingPolicy::default(),
            kill_switch: KillSwitch::default(),
            allocation: AllocationConfig::default(),
            orders: OrderConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ScanConfig {
    /// Load and validate a TOML config file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Parse and validate a TOML config string.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: ScanConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Structural validation beyond what serde enforces.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.universe.is_empty() {
            return Err(ConfigError::Invalid("universe is empty".into()));
        }
        if self.index_symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("index_symbol is empty".into()));
        }
        if self.universe.iter().any(|s| s == &self.index_symbol) {
            return Err(ConfigError::Invalid(format!(
                "index symbol {} cannot also be in the universe",
                self.index_symbol
            )));
        }
        if !(self.capital > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "capital must be positive, got {}",
                self.capital
            )));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be >= 1".into()));
        }
        if !(0.0..=1.0).contains(&self.gating.min_robustness)
            || !(0.0..=1.0).contains(&self.gating.min_stability)
        {
            return Err(ConfigError::Invalid(
                "gating thresholds must lie in [0, 1]".into(),
            ));
        }
        let alloc = &self.allocation;
        if !(alloc.max_position_pct > 0.0 && alloc.max_position_pct <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "max_position_pct must lie in (0, 1], got {}",
                alloc.max_position_pct
            )));
        }
        if !(alloc.total_invested > 0.0 && alloc.total_invested <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "total_invested must lie in (0, 1], got {}",
                alloc.total_invested
            )));
        }
        if alloc.max_positions == 0 {
            return Err(ConfigError::Invalid("max_positions must be >= 1".into()));
        }
        Ok(())
    }

    /// Computes a deterministic hash ID for this configuration.
    ///
    /// Two scans with identical configs share a ScanId, which makes decision
    /// logs and order files attributable to an exact parameterization.
    pub fn scan_id(&self) -> ScanId {
        let json = serde_json::to_string(self).expect("ScanConfig serialization failed");
        let hash = blake3::hash(json.as_bytes());
        format!("{}", hash.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> ScanConfig {
        ScanConfig {
            universe: vec!["AAPL".into(), "MSFT".into()],
            ..ScanConfig::default()
        }
    }

    #[test]
    fn scan_id_is_deterministic() {
        let config = sample_config();
        assert_eq!(config.scan_id(), config.scan_id());
        assert!(!config.scan_id().is_empty());
    }

    #[test]
    fn scan_id_changes_with_params() {
        let config1 = sample_config();
        let mut config2 = config1.clone();
        config2.gating.min_robustness = 0.8;
        assert_ne!(config1.scan_id(), config2.scan_id());
    }

    #[test]
    fn toml_roundtrip_with_defaults() {
        let text = r#"
            universe = ["AAPL", "MSFT", "NVDA"]
            index_symbol = "SPY"
            capital = 250000.0

            [gating]
            min_robustness = 0.75

            [allocation]
            max_positions = 5
        "#;
        let config = ScanConfig::from_toml(text).unwrap();
        assert_eq!(config.universe.len(), 3);
        assert_eq!(config.capital, 250_000.0);
        assert_eq!(config.gating.min_robustness, 0.75);
        // Unspecified fields keep their defaults.
        assert_eq!(config.gating.min_stability, 0.50);
        assert_eq!(config.allocation.max_positions, 5);
        assert_eq!(config.workers, 4);
    }

    #[test]
    fn empty_universe_is_rejected() {
        let err = ScanConfig::from_toml("universe = []").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn index_in_universe_is_rejected() {
        let text = r#"
            universe = ["SPY", "AAPL"]
            index_symbol = "SPY"
        "#;
        assert!(ScanConfig::from_toml(text).is_err());
    }

    #[test]
    fn nonsense_capital_is_rejected() {
        let text = r#"
            universe = ["AAPL"]
            capital = -5.0
        "#;
        assert!(ScanConfig::from_toml(text).is_err());
    }
}

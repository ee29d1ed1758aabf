//! Market regime taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The six market regimes recognized by the classifier.
///
/// A closed enum: every consumer matches exhaustively, so adding a regime
/// is a compile-time event rather than a silent string mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MarketRegime {
    BullQuiet,
    BullVolatile,
    BearQuiet,
    BearVolatile,
    Neutral,
    Crash,
}

impl MarketRegime {
    /// All regimes in a fixed order (stable iteration for reports).
    pub const ALL: [MarketRegime; 6] = [
        MarketRegime::BullQuiet,
        MarketRegime::BullVolatile,
        MarketRegime::BearQuiet,
        MarketRegime::BearVolatile,
        MarketRegime::Neutral,
        MarketRegime::Crash,
    ];

    /// Regimes where long exposure is hostile by construction.
    pub fn is_hostile(&self) -> bool {
        matches!(self, MarketRegime::Crash | MarketRegime::BearVolatile)
    }
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MarketRegime::BullQuiet => "Bull Quiet",
            MarketRegime::BullVolatile => "Bull Volatile",
            MarketRegime::BearQuiet => "Bear Quiet",
            MarketRegime::BearVolatile => "Bear Volatile",
            MarketRegime::Neutral => "Neutral",
            MarketRegime::Crash => "Crash",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostile_regimes() {
        assert!(MarketRegime::Crash.is_hostile());
        assert!(MarketRegime::BearVolatile.is_hostile());
        assert!(!MarketRegime::BullQuiet.is_hostile());
        assert!(!MarketRegime::Neutral.is_hostile());
    }

    #[test]
    fn regime_serde_roundtrip() {
        for regime in MarketRegime::ALL {
            let json = serde_json::to_string(&regime).unwrap();
            let back: MarketRegime = serde_json::from_str(&json).unwrap();
            assert_eq!(regime, back);
        }
    }

    #[test]
    fn display_labels() {
        assert_eq!(MarketRegime::BullQuiet.to_string(), "Bull Quiet");
        assert_eq!(MarketRegime::Crash.to_string(), "Crash");
    }
}

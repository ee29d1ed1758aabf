//! Append-only JSONL decision log.
//!
//! Every gate outcome, kill-switch trip, and emitted order is recorded as
//! one JSON line so a scan can be audited after the fact. The log is
//! append-only; corrupt or truncated lines are skipped on read rather
//! than poisoning the whole file.

use alphagate_core::domain::MarketRegime;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Ticker cleared every gate.
    Pass,
    /// Ticker rejected by one or more gates.
    Skip,
    /// Ticker evaluation failed (bad data, insufficient history).
    Error,
    /// Order emitted for this ticker.
    Buy,
    /// Scan-level event (abort, kill switch, completion).
    Scan,
}

/// Metric snapshot attached to per-ticker entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub regime: MarketRegime,
    pub fss: f64,
    pub robustness: f64,
    pub stability: f64,
    pub kelly_fraction: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionEntry {
    /// RFC 3339 UTC timestamp.
    pub timestamp: String,
    pub scan_id: String,
    /// None for scan-level events.
    pub symbol: Option<String>,
    pub decision: Decision,
    pub reasons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub metrics: Option<MetricsSnapshot>,
}

impl DecisionEntry {
    pub fn ticker(
        scan_id: &str,
        symbol: &str,
        decision: Decision,
        reasons: Vec<String>,
        metrics: Option<MetricsSnapshot>,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            scan_id: scan_id.to_string(),
            symbol: Some(symbol.to_string()),
            decision,
            reasons,
            metrics,
        }
    }

    pub fn scan_event(scan_id: &str, reasons: Vec<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            scan_id: scan_id.to_string(),
            symbol: None,
            decision: Decision::Scan,
            reasons,
            metrics: None,
        }
    }
}

/// File-backed decision log.
#[derive(Debug, Clone)]
pub struct DecisionLog {
    path: PathBuf,
}

impl DecisionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry as a JSON line, creating the file (and parent
    /// directories) on first write.
    pub fn append(&self, entry: &DecisionEntry) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let json = serde_json::to_string(entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(file, "{json}")?;
        file.flush()?;
        Ok(())
    }

    pub fn append_all(&self, entries: &[DecisionEntry]) -> std::io::Result<()> {
        for entry in entries {
            self.append(entry)?;
        }
        Ok(())
    }

    /// Read every parseable entry; malformed lines are skipped.
    pub fn read_all(&self) -> std::io::Result<Vec<DecisionEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = std::fs::File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<DecisionEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(_) => continue,
            }
        }
        Ok(entries)
    }
}

//! AlphaGate CLI — scan and report commands.
//!
//! Commands:
//! - `scan` — run a full gating scan from a TOML config against a CSV data
//!   directory, writing orders.csv and decisions.jsonl
//! - `report` — summarize a decision log

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use alphagate_runner::decision_log::{Decision, DecisionLog};
use alphagate_runner::scan::{run_scan, ScanReport, ScanStatus};
use alphagate_runner::{ingest, orders, ScanConfig};

#[derive(Parser)]
#[command(name = "alphagate", about = "AlphaGate — signal gating and allocation scanner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scan: evaluate the universe, gate, allocate, and size orders.
    Scan {
        /// Path to a TOML scan config.
        #[arg(long)]
        config: PathBuf,

        /// Directory of per-symbol CSV bar files (SYMBOL.csv).
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Output directory for orders.csv and decisions.jsonl.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Summarize a decision log.
    Report {
        /// Path to a decisions.jsonl file.
        #[arg(long, default_value = "results/decisions.jsonl")]
        log: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Scan {
            config,
            data_dir,
            output_dir,
        } => run_scan_cmd(&config, &data_dir, &output_dir),
        Commands::Report { log } => run_report_cmd(&log),
    }
}

fn run_scan_cmd(config_path: &Path, data_dir: &Path, output_dir: &Path) -> Result<()> {
    let config = ScanConfig::from_path(config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    let data = ingest::load_universe(data_dir, &config)
        .with_context(|| format!("loading bar data from {}", data_dir.display()))?;

    let report = run_scan(&config, &data);

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let log = DecisionLog::new(output_dir.join("decisions.jsonl"));
    log.append_all(&report.decisions)
        .context("writing decision log")?;

    if !report.orders.is_empty() {
        let orders_path = output_dir.join("orders.csv");
        orders::write_csv(&orders_path, &report.orders).context("writing orders.csv")?;
        println!("Orders written to {}", orders_path.display());
    }

    print_summary(&report);

    if report.status == ScanStatus::Failed {
        bail!(
            "scan failed: {}",
            report.reason.as_deref().unwrap_or("unknown")
        );
    }
    Ok(())
}

fn print_summary(report: &ScanReport) {
    println!("Scan {} — {}", report.scan_id, report.status);
    if let Some(as_of) = report.as_of {
        println!("  As of:            {as_of}");
    }
    println!("  Market regime:    {}", report.market_regime);
    println!("  Regime confidence:{:>7.2}", report.regime_confidence);
    println!("  Data coverage:    {:>7.2}", report.data_coverage);
    println!(
        "  Tickers:          {} evaluated, {} accepted",
        report.evaluated, report.accepted
    );
    if let Some(reason) = &report.reason {
        println!("  Reason:           {reason}");
    }
    if let Some(portfolio) = &report.portfolio {
        println!(
            "  Portfolio:        vol {:.3}, diversification {:.2}",
            portfolio.expected_volatility, portfolio.diversification_score
        );
    }
    for order in &report.orders {
        println!(
            "  BUY {:<6} {:>6} shares @ {:>9.2}  (weight {:.1}%, fss {:.1})",
            order.symbol,
            order.shares,
            order.limit_price,
            order.weight * 100.0,
            order.fss
        );
    }
}

fn run_report_cmd(log_path: &Path) -> Result<()> {
    let log = DecisionLog::new(log_path);
    let entries = log.read_all().context("reading decision log")?;
    if entries.is_empty() {
        bail!("no entries in {}", log_path.display());
    }

    let mut by_decision: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_scan: BTreeMap<String, usize> = BTreeMap::new();
    for entry in &entries {
        let key = serde_json::to_string(&entry.decision)?
            .trim_matches('"')
            .to_string();
        *by_decision.entry(key).or_insert(0) += 1;
        *by_scan.entry(entry.scan_id.clone()).or_insert(0) += 1;
    }

    println!("{} entries across {} scan(s)", entries.len(), by_scan.len());
    for (decision, count) in &by_decision {
        println!("  {decision:<14} {count}");
    }

    // Most recent scan's rejections, grouped by first reason.
    if let Some(last) = entries.last() {
        let scan_id = &last.scan_id;
        let mut reasons: BTreeMap<&str, usize> = BTreeMap::new();
        for entry in entries
            .iter()
            .filter(|e| &e.scan_id == scan_id && e.decision == Decision::Skip)
        {
            if let Some(first) = entry.reasons.first() {
                *reasons.entry(first.as_str()).or_insert(0) += 1;
            }
        }
        if !reasons.is_empty() {
            println!("Latest scan skip reasons:");
            for (reason, count) in &reasons {
                println!("  {count:>4}  {reason}");
            }
        }
    }
    Ok(())
}

//! Scan orchestration.
//!
//! One scan walks the full chain: classify the market regime, bail out of
//! hostile regimes, evaluate every ticker in parallel (history, robustness,
//! stability, Kelly), apply the gates and the kill switch, allocate the
//! survivors, and size orders. Every step leaves decision-log entries so
//! the outcome is auditable.

use alphagate_core::allocation::{self, Candidate, PortfolioWeights};
use alphagate_core::domain::{Bar, MarketRegime, Order};
use alphagate_core::gating::TickerMetrics;
use alphagate_core::history::HARD_FLOOR;
use alphagate_core::regime;
use alphagate_core::stats;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{info, warn};

use crate::config::ScanConfig;
use crate::decision_log::{Decision, DecisionEntry, MetricsSnapshot};
use crate::ingest::{self, UniverseData};
use crate::orders;

const ANNUALIZATION: f64 = 252.0;
const RETURN_LOOKBACK: usize = 252;
const VOLUME_LOOKBACK: usize = 20;
const VOL_WINDOW: usize = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanStatus {
    /// Orders were produced.
    Success,
    /// Scan ran to completion but nothing cleared the gates or sized > 0.
    NoPositions,
    /// Market regime is on the forbidden list; nothing was evaluated.
    Aborted,
    /// A kill-switch condition tripped after gating.
    KillSwitch,
    /// Allocation refused or a structural failure occurred.
    Failed,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScanStatus::Success => "SUCCESS",
            ScanStatus::NoPositions => "NO_POSITIONS",
            ScanStatus::Aborted => "ABORTED",
            ScanStatus::KillSwitch => "KILL_SWITCH",
            ScanStatus::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_id: String,
    pub status: ScanStatus,
    /// Populated for Aborted / KillSwitch / Failed.
    pub reason: Option<String>,
    pub as_of: Option<NaiveDate>,
    pub market_regime: MarketRegime,
    pub regime_confidence: f64,
    pub data_coverage: f64,
    pub evaluated: usize,
    pub accepted: usize,
    pub orders: Vec<Order>,
    pub portfolio: Option<PortfolioWeights>,
    pub decisions: Vec<DecisionEntry>,
}

/// Everything a ticker needs downstream of its evaluation.
#[derive(Debug, Clone)]
struct Evaluation {
    metrics: TickerMetrics,
    last_close: f64,
    volatility: f64,
    daily_returns: Vec<f64>,
}

/// Run one full scan over already-loaded universe data.
pub fn run_scan(config: &ScanConfig, data: &UniverseData) -> ScanReport {
    let scan_id = config.scan_id();
    let mut decisions: Vec<DecisionEntry> = Vec::new();

    let as_of = data.index.last().map(|bar| bar.date);
    let market_regime = regime::classify(&data.index);
    let regime_confidence = regime::confidence(&data.index);

    info!(
        scan_id = %scan_id,
        market_regime = %market_regime,
        regime_confidence,
        universe = config.universe.len(),
        "scan start"
    );

    let mut report = ScanReport {
        scan_id: scan_id.clone(),
        status: ScanStatus::NoPositions,
        reason: None,
        as_of,
        market_regime,
        regime_confidence,
        data_coverage: 0.0,
        evaluated: 0,
        accepted: 0,
        orders: Vec::new(),
        portfolio: None,
        decisions: Vec::new(),
    };

    if data.index.is_empty() {
        let reason = "index series is empty".to_string();
        decisions.push(DecisionEntry::scan_event(&scan_id, vec![reason.clone()]));
        report.status = ScanStatus::Failed;
        report.reason = Some(reason);
        report.decisions = decisions;
        return report;
    }

    // Config validation enforces this on the file-loading path, but
    // run_scan is also a library entry point.
    if config.universe.is_empty() {
        let reason = "universe is empty".to_string();
        decisions.push(DecisionEntry::scan_event(&scan_id, vec![reason.clone()]));
        report.status = ScanStatus::Failed;
        report.reason = Some(reason);
        report.decisions = decisions;
        return report;
    }

    if config.gating.forbidden_regimes.contains(&market_regime) {
        let reason = format!("market regime {market_regime} is forbidden, scan aborted");
        warn!(scan_id = %scan_id, market_regime = %market_regime, "aborting in hostile regime");
        decisions.push(DecisionEntry::scan_event(&scan_id, vec![reason.clone()]));
        report.status = ScanStatus::Aborted;
        report.reason = Some(reason);
        report.decisions = decisions;
        return report;
    }

    let needed = config.history.min_history.max(HARD_FLOOR);
    let sufficient = config
        .universe
        .iter()
        .filter(|sym| data.bars.get(*sym).is_some_and(|b| b.len() >= needed))
        .count();
    let data_coverage = sufficient as f64 / config.universe.len() as f64;
    report.data_coverage = data_coverage;

    // Per-ticker evaluation is independent, so it parallelizes cleanly.
    let with_data: Vec<(&String, &Vec<Bar>)> = config
        .universe
        .iter()
        .filter_map(|sym| data.bars.get(sym).map(|bars| (sym, bars)))
        .collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.max(1))
        .build()
        .expect("failed to build Rayon thread pool");

    let outcomes: Vec<(String, Result<Evaluation, String>)> = pool.install(|| {
        with_data
            .par_iter()
            .map(|(sym, bars)| {
                (
                    (*sym).clone(),
                    evaluate_ticker(config, sym.as_str(), bars.as_slice(), &data.index),
                )
            })
            .collect()
    });
    let mut outcome_map: HashMap<String, Result<Evaluation, String>> =
        outcomes.into_iter().collect();

    let mut evaluations: Vec<Evaluation> = Vec::new();
    for symbol in &config.universe {
        match outcome_map.remove(symbol) {
            None => {
                decisions.push(DecisionEntry::ticker(
                    &scan_id,
                    symbol,
                    Decision::Error,
                    vec!["no data loaded".into()],
                    None,
                ));
            }
            Some(Err(reason)) => {
                decisions.push(DecisionEntry::ticker(
                    &scan_id,
                    symbol,
                    Decision::Error,
                    vec![reason],
                    None,
                ));
            }
            Some(Ok(eval)) => {
                report.evaluated += 1;
                evaluations.push(eval);
            }
        }
    }

    // Gate each evaluated ticker; all failing reasons are logged at once.
    let mut accepted: Vec<&Evaluation> = Vec::new();
    for eval in &evaluations {
        let decision = config.gating.decide(&eval.metrics);
        let kind = if decision.accepted {
            Decision::Pass
        } else {
            Decision::Skip
        };
        decisions.push(DecisionEntry::ticker(
            &scan_id,
            &eval.metrics.symbol,
            kind,
            decision.reasons,
            Some(snapshot(&eval.metrics, None)),
        ));
        if decision.accepted {
            accepted.push(eval);
        }
    }
    report.accepted = accepted.len();

    let accepted_metrics: Vec<&TickerMetrics> = accepted.iter().map(|e| &e.metrics).collect();
    let triggered = config
        .kill_switch
        .check(data_coverage, regime_confidence, &accepted_metrics);
    if !triggered.is_empty() {
        let reason = triggered.join("; ");
        warn!(scan_id = %scan_id, reason = %reason, "kill switch tripped");
        decisions.push(DecisionEntry::scan_event(&scan_id, triggered));
        report.status = ScanStatus::KillSwitch;
        report.reason = Some(reason);
        report.decisions = decisions;
        return report;
    }

    if accepted.is_empty() {
        decisions.push(DecisionEntry::scan_event(
            &scan_id,
            vec!["no tickers cleared the gates".into()],
        ));
        report.status = ScanStatus::NoPositions;
        report.decisions = decisions;
        return report;
    }

    let candidates: Vec<Candidate> = accepted
        .iter()
        .map(|eval| Candidate {
            symbol: eval.metrics.symbol.clone(),
            kelly_fraction: eval.metrics.kelly_fraction,
            fss: eval.metrics.fss,
            robustness: eval.metrics.robustness,
            volatility: eval.volatility,
            daily_returns: eval.daily_returns.clone(),
        })
        .collect();

    let portfolio = match allocation::kelly_constrained(&config.allocation, &candidates) {
        Ok(portfolio) => portfolio,
        Err(err) => {
            let reason = format!("allocation failed: {err}");
            warn!(scan_id = %scan_id, reason = %reason, "scan failed");
            decisions.push(DecisionEntry::scan_event(&scan_id, vec![reason.clone()]));
            report.status = ScanStatus::Failed;
            report.reason = Some(reason);
            report.decisions = decisions;
            return report;
        }
    };

    let by_symbol: HashMap<&str, &Evaluation> = accepted
        .iter()
        .map(|e| (e.metrics.symbol.as_str(), *e))
        .collect();
    let order_date = as_of.unwrap_or_default();
    for (symbol, weight) in &portfolio.weights {
        let Some(eval) = by_symbol.get(symbol.as_str()) else {
            continue;
        };
        if let Some(order) = orders::build_order(
            &config.orders,
            config.capital,
            order_date,
            *weight,
            eval.last_close,
            &eval.metrics,
        ) {
            decisions.push(DecisionEntry::ticker(
                &scan_id,
                symbol,
                Decision::Buy,
                vec![format!("{} shares at limit {:.2}", order.shares, order.limit_price)],
                Some(snapshot(&eval.metrics, Some(*weight))),
            ));
            report.orders.push(order);
        }
    }

    report.status = if report.orders.is_empty() {
        ScanStatus::NoPositions
    } else {
        ScanStatus::Success
    };
    decisions.push(DecisionEntry::scan_event(
        &scan_id,
        vec![format!(
            "scan complete: {} evaluated, {} accepted, {} orders",
            report.evaluated,
            report.accepted,
            report.orders.len()
        )],
    ));
    info!(
        scan_id = %scan_id,
        status = %report.status,
        orders = report.orders.len(),
        "scan complete"
    );
    report.portfolio = Some(portfolio);
    report.decisions = decisions;
    report
}

fn snapshot(metrics: &TickerMetrics, weight: Option<f64>) -> MetricsSnapshot {
    MetricsSnapshot {
        regime: metrics.regime,
        fss: metrics.fss,
        robustness: metrics.robustness,
        stability: metrics.stability,
        kelly_fraction: metrics.kelly_fraction,
        weight,
    }
}

/// Evaluate one ticker end to end. Errors are human-readable reasons for
/// the decision log, not panics.
fn evaluate_ticker(
    config: &ScanConfig,
    symbol: &str,
    bars: &[Bar],
    index: &[Bar],
) -> Result<Evaluation, String> {
    let (aligned, aligned_index) = ingest::align_with_index(bars, index);
    let needed = config.history.min_history.max(HARD_FLOOR);
    if aligned.len() < needed {
        return Err(format!(
            "insufficient history ({} aligned bars, need {})",
            aligned.len(),
            needed
        ));
    }

    let closes: Vec<f64> = aligned.iter().map(|b| b.close).collect();
    let index_closes: Vec<f64> = aligned_index.iter().map(|b| b.close).collect();
    let fss = config
        .history
        .scorer
        .fss(&closes, &index_closes)
        .ok_or_else(|| "signal warmup not complete".to_string())?;

    let records = config.history.build(&aligned, &aligned_index);
    let result = config.evaluator.evaluate(&records);

    let all_returns: Vec<f64> = closes.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
    let start = all_returns.len().saturating_sub(RETURN_LOOKBACK);
    let daily_returns = all_returns[start..].to_vec();

    let vol_start = daily_returns.len().saturating_sub(VOL_WINDOW);
    let volatility = stats::std_dev(&daily_returns[vol_start..]) * ANNUALIZATION.sqrt();

    let vol_slice_start = aligned.len().saturating_sub(VOLUME_LOOKBACK);
    let volumes: Vec<f64> = aligned[vol_slice_start..]
        .iter()
        .map(|b| b.volume as f64)
        .collect();
    let avg_volume = stats::mean(&volumes);

    let kelly = config.sizer.size(&daily_returns, fss);

    let metrics = TickerMetrics {
        symbol: symbol.to_string(),
        regime: regime::classify(&aligned),
        fss,
        robustness: result.regime_robustness,
        stability: result.signal_stability,
        kelly_fraction: kelly.recommended_fraction,
        avg_volume,
    };

    // Last close is sane by ingest validation, but guard anyway since the
    // order limit derives from it.
    let last_close = closes.last().copied().filter(|c| c.is_finite() && *c > 0.0);
    let last_close = last_close.ok_or_else(|| "no usable last close".to_string())?;

    Ok(Evaluation {
        metrics,
        last_close,
        volatility,
        daily_returns,
    })
}

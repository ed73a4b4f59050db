//! Performance statistics — pure functions over the run outputs.
//!
//! Every metric is a pure function: equity curve and/or trade log in,
//! scalar out. Nothing here touches the feed, broker, or engine.

use crate::domain::{EquityPoint, OrderSide, TradeRecord};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Annualization constant for daily bars.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Period-over-period simple returns. Points following a non-positive
/// equity value are skipped.
pub fn period_returns(curve: &[EquityPoint]) -> Vec<f64> {
    curve
        .windows(2)
        .filter(|w| w[0].equity > 0.0)
        .map(|w| w[1].equity / w[0].equity - 1.0)
        .collect()
}

/// Total return as a fraction: (final − initial) / initial.
pub fn total_return(curve: &[EquityPoint]) -> f64 {
    match (curve.first(), curve.last()) {
        (Some(first), Some(last)) if curve.len() >= 2 && first.equity > 0.0 => {
            (last.equity - first.equity) / first.equity
        }
        _ => 0.0,
    }
}

/// Geometric growth from first to last equity, annualized by
/// `periods_per_year`. Returns 0.0 for degenerate curves.
pub fn annualized_return(curve: &[EquityPoint], periods_per_year: f64) -> f64 {
    if curve.len() < 2 {
        return 0.0;
    }
    let first = curve[0].equity;
    let last = curve[curve.len() - 1].equity;
    if first <= 0.0 || last <= 0.0 {
        return 0.0;
    }
    let periods = (curve.len() - 1) as f64;
    (last / first).powf(periods_per_year / periods) - 1.0
}

/// Population standard deviation of period returns, annualized by the
/// square root of `periods_per_year`.
pub fn annualized_volatility(curve: &[EquityPoint], periods_per_year: f64) -> f64 {
    let returns = period_returns(curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance =
        returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    variance.sqrt() * periods_per_year.sqrt()
}

/// (annualized return − risk-free rate) / annualized volatility.
///
/// NaN when volatility is zero: the ratio is undefined, and a zero or
/// sentinel value would silently rank a flat curve.
pub fn sharpe_ratio(curve: &[EquityPoint], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    let volatility = annualized_volatility(curve, periods_per_year);
    if volatility == 0.0 {
        return f64::NAN;
    }
    (annualized_return(curve, periods_per_year) - risk_free_rate) / volatility
}

/// The deepest peak-to-trough decline with its bracketing dates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownWindow {
    /// Relative decline as a non-positive fraction (−0.15 = 15% down).
    pub depth: f64,
    pub peak_date: NaiveDate,
    pub trough_date: NaiveDate,
}

/// Scan forward tracking the running peak; `None` on an empty curve.
pub fn drawdown_window(curve: &[EquityPoint]) -> Option<DrawdownWindow> {
    let first = curve.first()?;
    let mut peak = first.equity;
    let mut peak_date = first.date;
    let mut worst = DrawdownWindow {
        depth: 0.0,
        peak_date,
        trough_date: peak_date,
    };
    for point in &curve[1..] {
        if point.equity > peak {
            peak = point.equity;
            peak_date = point.date;
        }
        if peak > 0.0 {
            let drawdown = point.equity / peak - 1.0;
            if drawdown < worst.depth {
                worst = DrawdownWindow {
                    depth: drawdown,
                    peak_date,
                    trough_date: point.date,
                };
            }
        }
    }
    Some(worst)
}

/// Maximum drawdown as a non-positive fraction; 0.0 when equity never
/// declines.
pub fn max_drawdown(curve: &[EquityPoint]) -> f64 {
    drawdown_window(curve).map_or(0.0, |w| w.depth)
}

/// Per-calendar-year returns, each year measured against the prior
/// year-end equity (the first year against its own first observation).
pub fn annual_returns(curve: &[EquityPoint]) -> Vec<(i32, f64)> {
    let mut year_start: BTreeMap<i32, f64> = BTreeMap::new();
    let mut year_end: BTreeMap<i32, f64> = BTreeMap::new();
    for point in curve {
        let year = point.date.year();
        year_start.entry(year).or_insert(point.equity);
        year_end.insert(year, point.equity);
    }

    let mut out = Vec::with_capacity(year_end.len());
    let mut prev_year_end: Option<f64> = None;
    for (year, &end) in &year_end {
        let start = prev_year_end.unwrap_or(year_start[year]);
        let ret = if start > 0.0 { end / start - 1.0 } else { 0.0 };
        out.push((*year, ret));
        prev_year_end = Some(end);
    }
    out
}

/// A realized exit: one sell fill matched against the running average
/// cost of its symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTrip {
    pub symbol: String,
    pub exit_date: NaiveDate,
    pub size: u64,
    /// Average entry price at the moment of exit.
    pub entry_price: f64,
    pub exit_price: f64,
    /// (exit − entry) × size − sell-side fee.
    pub realized_pnl: f64,
}

impl RoundTrip {
    pub fn is_winner(&self) -> bool {
        self.realized_pnl > 0.0
    }
}

/// Replay the fill log per symbol under average-cost accounting and
/// extract every realized round trip, in log order.
pub fn round_trips(trades: &[TradeRecord]) -> Vec<RoundTrip> {
    // symbol → (size, average entry price)
    let mut book: BTreeMap<&str, (u64, f64)> = BTreeMap::new();
    let mut trips = Vec::new();
    for trade in trades {
        if trade.filled == 0 {
            continue;
        }
        let entry = book.entry(trade.symbol.as_str()).or_insert((0, 0.0));
        match trade.side {
            OrderSide::Buy => {
                let prev_value = entry.1 * entry.0 as f64;
                entry.0 += trade.filled;
                entry.1 = (prev_value + trade.exec_price * trade.filled as f64) / entry.0 as f64;
            }
            OrderSide::Sell => {
                if entry.0 == 0 {
                    continue;
                }
                let size = trade.filled.min(entry.0);
                trips.push(RoundTrip {
                    symbol: trade.symbol.clone(),
                    exit_date: trade.date,
                    size,
                    entry_price: entry.1,
                    exit_price: trade.exec_price,
                    realized_pnl: (trade.exec_price - entry.1) * size as f64 - trade.fee,
                });
                entry.0 -= size;
                if entry.0 == 0 {
                    entry.1 = 0.0;
                }
            }
        }
    }
    trips
}

/// Fraction of realized round trips with positive profit; 0.0 when
/// nothing was realized.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    let trips = round_trips(trades);
    if trips.is_empty() {
        return 0.0;
    }
    let winners = trips.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trips.len() as f64
}

/// Aggregate performance metrics for a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub round_trip_count: usize,
    pub fill_count: usize,
}

impl PerformanceMetrics {
    pub fn compute(
        curve: &[EquityPoint],
        trades: &[TradeRecord],
        risk_free_rate: f64,
        periods_per_year: f64,
    ) -> Self {
        Self {
            total_return: total_return(curve),
            annualized_return: annualized_return(curve, periods_per_year),
            annualized_volatility: annualized_volatility(curve, periods_per_year),
            sharpe: sharpe_ratio(curve, risk_free_rate, periods_per_year),
            max_drawdown: max_drawdown(curve),
            win_rate: win_rate(trades),
            round_trip_count: round_trips(trades).len(),
            fill_count: trades.len(),
        }
    }
}

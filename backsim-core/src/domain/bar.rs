//! Bar — the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLC bar plus the prior session's percent change, when known.
///
/// Bars are produced by an upstream data pipeline and consumed read-only.
/// The feed contract guarantees unique, strictly increasing dates; the core
/// trusts that ordering and performs no calendar validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Previous session's percent change (e.g. `1.5` = +1.5%), if the
    /// upstream store carried it.
    pub pct_chg: Option<f64>,
}

impl Bar {
    /// Basic OHLC sanity check: high >= low, extremes bracket open/close.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

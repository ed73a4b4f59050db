//! EquityPoint — one mark-to-market observation per tick.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Total portfolio equity at the end of one bar.
///
/// The engine appends exactly one point per bar, in feed order; the
/// resulting sequence is the run's primary output alongside the trade log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

impl EquityPoint {
    pub fn new(date: NaiveDate, equity: f64) -> Self {
        Self { date, equity }
    }
}

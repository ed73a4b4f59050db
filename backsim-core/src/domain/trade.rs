//! TradeRecord — the append-only audit entry written on every fill.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Immutable record of a single fill.
///
/// Appended by the broker on every non-zero fill while the trade log is
/// enabled; never edited or removed. `requested` and `filled` differ when
/// the fill was reduced (insufficient cash on buys, clipping to the held
/// size on sells).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub symbol: String,
    pub side: OrderSide,
    /// Raw quote price the order was placed against (before slippage).
    pub price: f64,
    /// Slippage-adjusted execution price.
    pub exec_price: f64,
    pub requested: u64,
    pub filled: u64,
    /// Gross fill value: `exec_price * filled`.
    pub notional: f64,
    /// Commission, plus transaction tax on sells.
    pub fee: f64,
    pub cash_after: f64,
    pub position_after: u64,
    pub equity_after: f64,
}

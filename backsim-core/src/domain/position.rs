//! Position — per-symbol holding under weighted-average cost accounting.

use serde::{Deserialize, Serialize};

/// One open holding. Long-only: size is an unsigned unit count, so negative
/// inventory is unrepresentable. The broker removes a position the moment
/// its size reaches zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub size: u64,
    /// Weighted-average execution price across all entry fills. Individual
    /// lot history is intentionally discarded.
    pub avg_price: f64,
}

impl Position {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            size: 0,
            avg_price: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.size == 0
    }

    pub fn market_value(&self, current_price: f64) -> f64 {
        self.size as f64 * current_price
    }

    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        self.size as f64 * (current_price - self.avg_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_value_and_pnl() {
        let pos = Position {
            symbol: "510300.SH".into(),
            size: 100,
            avg_price: 10.0,
        };
        assert_eq!(pos.market_value(11.0), 1_100.0);
        assert_eq!(pos.unrealized_pnl(11.0), 100.0);
    }

    #[test]
    fn fresh_position_is_flat() {
        assert!(Position::new("510300.SH").is_flat());
    }
}

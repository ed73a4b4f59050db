//! Broker — the cash/position ledger under an explicit cost model.
//!
//! The broker owns the only mutable state in a run: cash, per-symbol
//! positions, last known mark prices, and the append-only trade log. The
//! accounting identity holds at every tick:
//! `total_equity == cash + sum(position size * mark price)`.
//!
//! Insufficient funds is never an error: buys silently reduce to the
//! largest affordable whole-unit quantity, possibly zero. Sells clip to
//! the held size. A non-positive quote price is fatal to the call.

pub mod cost_model;

pub use cost_model::CostModel;

use crate::config::BrokerConfig;
use crate::domain::{OrderSide, Position, TradeRecord};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from ledger operations.
#[derive(Debug, Error, PartialEq)]
pub enum BrokerError {
    #[error("invalid price {price} for {side:?} {symbol}: quotes must be positive")]
    InvalidPrice {
        symbol: String,
        side: OrderSide,
        price: f64,
    },

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Multi-symbol ledger: cash, positions, marks, and the trade log.
///
/// Positions use weighted-average cost accounting and are removed the
/// moment their size reaches zero. `BTreeMap` keeps every iteration
/// deterministic, which the bit-identical-rerun requirement depends on.
#[derive(Debug, Clone)]
pub struct Broker {
    cash: f64,
    positions: BTreeMap<String, Position>,
    last_marks: BTreeMap<String, f64>,
    trades: Vec<TradeRecord>,
    cost: CostModel,
    default_symbol: Option<String>,
    enable_trade_log: bool,
    total_fees: f64,
}

impl Broker {
    /// Build a ledger from a validated configuration.
    ///
    /// Fails with `Configuration` on non-positive initial cash or
    /// out-of-range cost-model parameters.
    pub fn new(config: BrokerConfig) -> Result<Self, BrokerError> {
        config.validate()?;
        Ok(Self {
            cash: config.initial_cash,
            positions: BTreeMap::new(),
            last_marks: BTreeMap::new(),
            trades: Vec::new(),
            cost: config.cost,
            default_symbol: config.default_symbol,
            enable_trade_log: config.enable_trade_log,
            total_fees: 0.0,
        })
    }

    // ── accessors ───────────────────────────────────────────────────

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn total_fees(&self) -> f64 {
        self.total_fees
    }

    pub fn cost(&self) -> &CostModel {
        &self.cost
    }

    pub fn default_symbol(&self) -> Option<&str> {
        self.default_symbol.as_deref()
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn positions(&self) -> &BTreeMap<String, Position> {
        &self.positions
    }

    /// Units currently held; zero for an unheld symbol.
    pub fn holding(&self, symbol: &str) -> u64 {
        self.positions.get(symbol).map_or(0, |p| p.size)
    }

    /// Last known mark price for a symbol, if any.
    pub fn mark(&self, symbol: &str) -> Option<f64> {
        self.last_marks.get(symbol).copied()
    }

    /// Ordered fill audit log (empty while the trade log is disabled).
    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    // ── valuation ───────────────────────────────────────────────────

    /// Replace the mark for every listed symbol; unlisted symbols keep
    /// their previous mark.
    pub fn update_marks(&mut self, marks: &BTreeMap<String, f64>) {
        for (symbol, price) in marks {
            self.last_marks.insert(symbol.clone(), *price);
        }
    }

    /// Cash plus every position valued at its last mark, falling back to
    /// average cost for a never-marked symbol.
    pub fn total_equity(&self) -> f64 {
        let position_value: f64 = self
            .positions
            .iter()
            .map(|(symbol, pos)| {
                let price = self
                    .last_marks
                    .get(symbol)
                    .copied()
                    .unwrap_or(pos.avg_price);
                pos.market_value(price)
            })
            .sum();
        self.cash + position_value
    }

    // ── fills ───────────────────────────────────────────────────────

    /// Buy up to `requested` units at `price` plus slippage.
    ///
    /// When cash cannot cover the requested size, the fill reduces to the
    /// largest affordable whole-unit quantity with the fee recomputed for
    /// that size; a zero fill leaves all state untouched. Returns the
    /// filled size.
    pub fn buy(
        &mut self,
        date: NaiveDate,
        symbol: &str,
        price: f64,
        requested: u64,
    ) -> Result<u64, BrokerError> {
        if !(price > 0.0) {
            return Err(BrokerError::InvalidPrice {
                symbol: symbol.to_string(),
                side: OrderSide::Buy,
                price,
            });
        }
        if requested == 0 {
            return Ok(0);
        }

        let exec_price = self.cost.execution_price(price, OrderSide::Buy);
        let mut filled = requested;
        let mut notional = exec_price * filled as f64;
        let mut fee = self.cost.buy_fee(notional);
        if notional + fee > self.cash {
            filled = self.max_affordable(exec_price, requested);
            if filled == 0 {
                return Ok(0);
            }
            notional = exec_price * filled as f64;
            fee = self.cost.buy_fee(notional);
        }

        self.cash -= notional + fee;
        self.total_fees += fee;

        let pos = self
            .positions
            .entry(symbol.to_string())
            .or_insert_with(|| Position::new(symbol));
        let prev_value = pos.avg_price * pos.size as f64;
        pos.size += filled;
        pos.avg_price = (prev_value + notional) / pos.size as f64;
        let position_after = pos.size;

        self.last_marks.insert(symbol.to_string(), exec_price);
        let equity_after = self.total_equity();
        self.record(TradeRecord {
            date,
            symbol: symbol.to_string(),
            side: OrderSide::Buy,
            price,
            exec_price,
            requested,
            filled,
            notional,
            fee,
            cash_after: self.cash,
            position_after,
            equity_after,
        });
        Ok(filled)
    }

    /// Sell up to `requested` units at `price` minus slippage.
    ///
    /// The fill clips to the held size; selling an unheld symbol is a
    /// no-op returning 0. The position is removed when its size reaches
    /// zero. Returns the filled size.
    pub fn sell(
        &mut self,
        date: NaiveDate,
        symbol: &str,
        price: f64,
        requested: u64,
    ) -> Result<u64, BrokerError> {
        if !(price > 0.0) {
            return Err(BrokerError::InvalidPrice {
                symbol: symbol.to_string(),
                side: OrderSide::Sell,
                price,
            });
        }
        let held = self.holding(symbol);
        if requested == 0 || held == 0 {
            return Ok(0);
        }

        let filled = requested.min(held);
        let exec_price = self.cost.execution_price(price, OrderSide::Sell);
        let notional = exec_price * filled as f64;
        let fee = self.cost.sell_fee(notional);

        self.cash += notional - fee;
        self.total_fees += fee;

        let position_after = held - filled;
        if position_after == 0 {
            self.positions.remove(symbol);
        } else if let Some(pos) = self.positions.get_mut(symbol) {
            pos.size = position_after;
        }

        self.last_marks.insert(symbol.to_string(), exec_price);
        let equity_after = self.total_equity();
        self.record(TradeRecord {
            date,
            symbol: symbol.to_string(),
            side: OrderSide::Sell,
            price,
            exec_price,
            requested,
            filled,
            notional,
            fee,
            cash_after: self.cash,
            position_after,
            equity_after,
        });
        Ok(filled)
    }

    /// Buy as many units as current cash covers at `price` plus slippage.
    pub fn buy_max(
        &mut self,
        date: NaiveDate,
        symbol: &str,
        price: f64,
    ) -> Result<u64, BrokerError> {
        if !(price > 0.0) {
            return Err(BrokerError::InvalidPrice {
                symbol: symbol.to_string(),
                side: OrderSide::Buy,
                price,
            });
        }
        let exec_price = self.cost.execution_price(price, OrderSide::Buy);
        let estimate = (self.cash / (exec_price * (1.0 + self.cost.commission_rate))) as u64;
        self.buy(date, symbol, price, estimate)
    }

    /// Liquidate the full holding in `symbol`.
    pub fn sell_all(
        &mut self,
        date: NaiveDate,
        symbol: &str,
        price: f64,
    ) -> Result<u64, BrokerError> {
        let held = self.holding(symbol);
        self.sell(date, symbol, price, held)
    }

    /// Alias for [`Broker::sell_all`].
    pub fn close(
        &mut self,
        date: NaiveDate,
        symbol: &str,
        price: f64,
    ) -> Result<u64, BrokerError> {
        self.sell_all(date, symbol, price)
    }

    // ── target orders ───────────────────────────────────────────────

    /// Adjust the holding to exactly `target` units with a single order.
    pub fn order_target_size(
        &mut self,
        date: NaiveDate,
        symbol: &str,
        price: f64,
        target: u64,
    ) -> Result<u64, BrokerError> {
        let held = self.holding(symbol);
        if target > held {
            self.buy(date, symbol, price, target - held)
        } else if target < held {
            self.sell(date, symbol, price, held - target)
        } else {
            Ok(0)
        }
    }

    /// Adjust the holding toward a target notional value, floored at the
    /// slippage-adjusted execution price.
    pub fn order_target_value(
        &mut self,
        date: NaiveDate,
        symbol: &str,
        price: f64,
        target_value: f64,
    ) -> Result<u64, BrokerError> {
        if !(price > 0.0) {
            return Err(BrokerError::InvalidPrice {
                symbol: symbol.to_string(),
                side: OrderSide::Buy,
                price,
            });
        }
        let target_value = target_value.max(0.0);
        let side = if target_value > 0.0 {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        };
        let exec_price = self.cost.execution_price(price, side);
        let target = (target_value / exec_price).floor() as u64;
        self.order_target_size(date, symbol, price, target)
    }

    /// One-shot move toward `target_weight` of `total_equity`.
    ///
    /// Compares the target notional against the current position notional
    /// at `price` and issues a single buy or sell for the difference,
    /// floored toward zero in whole units. No iterative convergence.
    pub fn order_target_percent(
        &mut self,
        date: NaiveDate,
        symbol: &str,
        price: f64,
        target_weight: f64,
        total_equity: f64,
    ) -> Result<u64, BrokerError> {
        if !(price > 0.0) {
            return Err(BrokerError::InvalidPrice {
                symbol: symbol.to_string(),
                side: if target_weight > 0.0 {
                    OrderSide::Buy
                } else {
                    OrderSide::Sell
                },
                price,
            });
        }
        let weight = target_weight.clamp(0.0, 1.0);
        self.last_marks.entry(symbol.to_string()).or_insert(price);
        let current_notional = self.holding(symbol) as f64 * price;
        let diff = weight * total_equity - current_notional;
        let units = (diff.abs() / price).floor() as u64;
        if units == 0 {
            Ok(0)
        } else if diff > 0.0 {
            self.buy(date, symbol, price, units)
        } else {
            self.sell(date, symbol, price, units)
        }
    }

    /// Batch rebalance to target percentage weights.
    ///
    /// Held symbols absent from `targets` are treated as weight 0 and
    /// fully liquidated. All sells execute before any buys, so freed cash
    /// is available when the buys run; this ordering is mandatory. Target
    /// sizes are floored at the slippage-adjusted execution price against
    /// pre-trade equity. Sells run in symbol order; buys follow the order
    /// of `targets`. Symbols without a positive price in `prices` are
    /// skipped.
    pub fn rebalance_target_percents(
        &mut self,
        date: NaiveDate,
        prices: &BTreeMap<String, f64>,
        targets: &[(String, f64)],
    ) -> Result<(), BrokerError> {
        let weights: Vec<(&str, f64)> = targets
            .iter()
            .filter(|(_, w)| *w > 0.0)
            .map(|(symbol, w)| (symbol.as_str(), w.min(1.0)))
            .collect();

        // seed marks so pre-trade equity sees newly targeted symbols
        for (symbol, price) in prices {
            if *price > 0.0 {
                self.last_marks.entry(symbol.clone()).or_insert(*price);
            }
        }
        let equity = self.total_equity();

        let weight_of = |symbol: &str| {
            weights
                .iter()
                .find(|(s, _)| *s == symbol)
                .map_or(0.0, |(_, w)| *w)
        };
        let target_size = |weight: f64, price: f64| {
            let side = if weight > 0.0 {
                OrderSide::Buy
            } else {
                OrderSide::Sell
            };
            let exec_price = self.cost.execution_price(price, side);
            ((equity * weight) / exec_price).floor() as u64
        };

        let mut sells: Vec<(String, u64, f64)> = Vec::new();
        for (symbol, pos) in &self.positions {
            let Some(&price) = prices.get(symbol) else {
                continue;
            };
            if price <= 0.0 {
                continue;
            }
            let target = target_size(weight_of(symbol), price);
            if target < pos.size {
                sells.push((symbol.clone(), pos.size - target, price));
            }
        }

        let mut buys: Vec<(String, u64, f64)> = Vec::new();
        for (symbol, weight) in &weights {
            let Some(&price) = prices.get(*symbol) else {
                continue;
            };
            if price <= 0.0 {
                continue;
            }
            let target = target_size(*weight, price);
            let held = self.holding(symbol);
            if target > held {
                buys.push((symbol.to_string(), target - held, price));
            }
        }

        for (symbol, size, price) in sells {
            self.sell(date, &symbol, price, size)?;
        }
        for (symbol, size, price) in buys {
            self.buy(date, &symbol, price, size)?;
        }
        Ok(())
    }

    // ── internals ───────────────────────────────────────────────────

    /// Largest whole-unit quantity current cash covers at `exec_price`
    /// including the recomputed fee, capped at `requested`.
    fn max_affordable(&self, exec_price: f64, requested: u64) -> u64 {
        // Both fee regimes give an upper bound on the feasible size; take
        // the tighter one and verify downward for float edges.
        let by_rate = self.cash / (exec_price * (1.0 + self.cost.commission_rate));
        let by_min = (self.cash - self.cost.min_commission) / exec_price;
        let bound = by_rate.min(by_min).max(0.0).floor() as u64;
        let mut size = bound.min(requested);
        while size > 0 {
            let notional = exec_price * size as f64;
            if notional + self.cost.buy_fee(notional) <= self.cash {
                break;
            }
            size -= 1;
        }
        size
    }

    fn record(&mut self, record: TradeRecord) {
        if self.enable_trade_log {
            self.trades.push(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrokerConfig;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn broker(cash: f64) -> Broker {
        Broker::new(BrokerConfig::new(cash)).unwrap()
    }

    #[test]
    fn buy_updates_average_cost_across_fills() {
        let mut b = Broker::new(BrokerConfig::new(1_000_000.0).with_cost(CostModel::frictionless()))
            .unwrap();
        b.buy(day(2), "600519.SH", 10.0, 100).unwrap();
        b.buy(day(3), "600519.SH", 20.0, 100).unwrap();
        let pos = b.position("600519.SH").unwrap();
        assert_eq!(pos.size, 200);
        assert!((pos.avg_price - 15.0).abs() < 1e-12);
    }

    #[test]
    fn unaffordable_single_unit_fills_zero_and_leaves_state() {
        let mut b = broker(10.0);
        let cash_before = b.cash();
        let filled = b.buy(day(2), "600519.SH", 10.0, 1).unwrap();
        assert_eq!(filled, 0);
        assert_eq!(b.cash(), cash_before);
        assert!(b.position("600519.SH").is_none());
        assert!(b.trades().is_empty());
    }

    #[test]
    fn insufficient_cash_reduces_fill() {
        let mut b = broker(1_000.0);
        let filled = b.buy(day(2), "600519.SH", 10.0, 1_000).unwrap();
        // exec price 10.002; minimum commission 5 → (1000 - 5) / 10.002 → 99
        assert_eq!(filled, 99);
        let record = &b.trades()[0];
        assert_eq!(record.requested, 1_000);
        assert_eq!(record.filled, 99);
        assert!(record.cash_after >= 0.0);
    }

    #[test]
    fn sell_clips_to_holding_and_removes_position() {
        let mut b = broker(1_000_000.0);
        b.buy(day(2), "600519.SH", 10.0, 100).unwrap();
        let filled = b.sell(day(3), "600519.SH", 11.0, 150).unwrap();
        assert_eq!(filled, 100);
        assert!(b.position("600519.SH").is_none());
    }

    #[test]
    fn selling_unheld_symbol_is_noop() {
        let mut b = broker(1_000.0);
        assert_eq!(b.sell(day(2), "600519.SH", 10.0, 5).unwrap(), 0);
        assert!(b.trades().is_empty());
    }

    #[test]
    fn non_positive_price_is_fatal() {
        let mut b = broker(1_000.0);
        assert!(matches!(
            b.buy(day(2), "600519.SH", 0.0, 1),
            Err(BrokerError::InvalidPrice { .. })
        ));
        assert!(matches!(
            b.sell(day(2), "600519.SH", -1.0, 1),
            Err(BrokerError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn equity_uses_marks_with_avg_cost_fallback() {
        let mut b = broker(1_000_000.0);
        b.buy(day(2), "600519.SH", 10.0, 100).unwrap();
        // fill marked the symbol at its execution price
        let exec = 10.0 * 1.000_2;
        assert!((b.total_equity() - (b.cash() + 100.0 * exec)).abs() < 1e-9);

        let mut marks = BTreeMap::new();
        marks.insert("600519.SH".to_string(), 12.0);
        b.update_marks(&marks);
        assert!((b.total_equity() - (b.cash() + 1_200.0)).abs() < 1e-9);
    }

    #[test]
    fn order_target_size_moves_both_directions() {
        let mut b = broker(1_000_000.0);
        b.order_target_size(day(2), "510300.SH", 10.0, 500).unwrap();
        assert_eq!(b.holding("510300.SH"), 500);
        b.order_target_size(day(3), "510300.SH", 10.0, 200).unwrap();
        assert_eq!(b.holding("510300.SH"), 200);
        assert_eq!(
            b.order_target_size(day(4), "510300.SH", 10.0, 200).unwrap(),
            0
        );
    }

    #[test]
    fn disabled_trade_log_keeps_accounting() {
        let config = BrokerConfig {
            enable_trade_log: false,
            ..BrokerConfig::new(1_000_000.0)
        };
        let mut b = Broker::new(config).unwrap();
        b.buy(day(2), "600519.SH", 10.0, 100).unwrap();
        assert!(b.trades().is_empty());
        assert_eq!(b.holding("600519.SH"), 100);
        assert!(b.total_fees() > 0.0);
    }

    #[test]
    fn construction_rejects_non_positive_cash() {
        assert!(Broker::new(BrokerConfig::new(0.0)).is_err());
        assert!(Broker::new(BrokerConfig::new(-5.0)).is_err());
        assert!(Broker::new(BrokerConfig::new(f64::NAN)).is_err());
    }
}

//! Cost model — slippage and fee calculation.
//!
//! Slippage is directional: buyers pay more, sellers receive less.
//! Commission applies to both sides with a per-trade minimum; transaction
//! tax applies to the sell side only.

use crate::broker::BrokerError;
use crate::domain::OrderSide;
use serde::{Deserialize, Serialize};

/// Execution friction parameters, supplied once at broker construction.
///
/// The three rates are fractions in `[0, 1)`; the minimum commission is in
/// currency units. There is no process-wide default state: every broker
/// carries its own validated copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    /// Commission as a fraction of notional, both sides.
    pub commission_rate: f64,
    /// Per-trade commission floor in currency units.
    pub min_commission: f64,
    /// Transaction tax as a fraction of notional, sell side only.
    pub tax_rate: f64,
    /// Fixed percentage execution-price drift.
    pub slippage_rate: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            commission_rate: 0.000_15,
            min_commission: 5.0,
            tax_rate: 0.000_5,
            slippage_rate: 0.000_2,
        }
    }
}

impl CostModel {
    pub fn frictionless() -> Self {
        Self {
            commission_rate: 0.0,
            min_commission: 0.0,
            tax_rate: 0.0,
            slippage_rate: 0.0,
        }
    }

    /// Check parameter ranges: rates in `[0, 1)`, minimum commission
    /// finite and non-negative.
    pub fn validate(&self) -> Result<(), BrokerError> {
        for (name, rate) in [
            ("commission_rate", self.commission_rate),
            ("tax_rate", self.tax_rate),
            ("slippage_rate", self.slippage_rate),
        ] {
            if !rate.is_finite() || !(0.0..1.0).contains(&rate) {
                return Err(BrokerError::Configuration(format!(
                    "{name} must be in [0, 1), got {rate}"
                )));
            }
        }
        if !self.min_commission.is_finite() || self.min_commission < 0.0 {
            return Err(BrokerError::Configuration(format!(
                "min_commission must be non-negative, got {}",
                self.min_commission
            )));
        }
        Ok(())
    }

    /// Slippage-adjusted execution price: buys pay up, sells receive less.
    pub fn execution_price(&self, price: f64, side: OrderSide) -> f64 {
        match side {
            OrderSide::Buy => price * (1.0 + self.slippage_rate),
            OrderSide::Sell => price * (1.0 - self.slippage_rate),
        }
    }

    /// Buy-side fee: commission only, floored at the minimum.
    pub fn buy_fee(&self, notional: f64) -> f64 {
        (notional * self.commission_rate).max(self.min_commission)
    }

    /// Sell-side fee: floored commission plus transaction tax.
    pub fn sell_fee(&self, notional: f64) -> f64 {
        (notional * self.commission_rate).max(self.min_commission) + notional * self.tax_rate
    }
}

//! Serializable broker configuration.

use crate::broker::{BrokerError, CostModel};
use serde::{Deserialize, Serialize};

/// Everything a [`crate::broker::Broker`] needs at construction.
///
/// Serializable so runs can be reproduced from a config file; parsing and
/// validation both surface as `Configuration` errors. There are no
/// process-wide defaults — each broker carries its own copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Starting cash; must be positive.
    pub initial_cash: f64,
    /// Symbol used for single-symbol valuation fallback when a strategy
    /// supplies no marks.
    pub default_symbol: Option<String>,
    /// Whether fills append to the audit log. Accounting is unaffected.
    pub enable_trade_log: bool,
    /// Execution friction parameters. Kept last so the TOML table
    /// serializes after the scalar fields.
    pub cost: CostModel,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            initial_cash: 1_000_000.0,
            default_symbol: None,
            enable_trade_log: true,
            cost: CostModel::default(),
        }
    }
}

impl BrokerConfig {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            initial_cash,
            ..Self::default()
        }
    }

    /// Default-cost config with all frictions zeroed.
    pub fn frictionless(initial_cash: f64) -> Self {
        Self::new(initial_cash).with_cost(CostModel::frictionless())
    }

    pub fn with_cost(mut self, cost: CostModel) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_default_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.default_symbol = Some(symbol.into());
        self
    }

    pub fn from_toml(content: &str) -> Result<Self, BrokerError> {
        toml::from_str(content)
            .map_err(|e| BrokerError::Configuration(format!("parse broker config TOML: {e}")))
    }

    pub fn to_toml(&self) -> Result<String, BrokerError> {
        toml::to_string_pretty(self)
            .map_err(|e| BrokerError::Configuration(format!("serialize broker config: {e}")))
    }

    pub fn validate(&self) -> Result<(), BrokerError> {
        if !self.initial_cash.is_finite() || self.initial_cash <= 0.0 {
            return Err(BrokerError::Configuration(format!(
                "initial_cash must be positive, got {}",
                self.initial_cash
            )));
        }
        self.cost.validate()
    }
}

//! Worked example strategies exercising the broker API end to end.

pub mod buy_and_hold;
pub mod equal_weight;
pub mod prior_day_momentum;

pub use buy_and_hold::BuyAndHold;
pub use equal_weight::{PeriodicEqualWeight, Quote, QuoteTable, RebalanceRecord};
pub use prior_day_momentum::PriorDayMomentum;

//! Domain types for the simulation core.

pub mod bar;
pub mod equity;
pub mod position;
pub mod trade;

pub use bar::Bar;
pub use equity::EquityPoint;
pub use position::Position;
pub use trade::{OrderSide, TradeRecord};

/// Symbol type alias
pub type Symbol = String;

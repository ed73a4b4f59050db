//! Buy-and-hold: full-cash entry on the first bar, then nothing.

use crate::broker::Broker;
use crate::domain::Bar;
use crate::engine::EngineError;
use crate::feed::BarFeed;
use crate::strategy::Strategy;

/// Enters at the first bar's open with all available cash and holds to
/// the end of the feed.
#[derive(Debug, Clone)]
pub struct BuyAndHold {
    symbol: String,
    entered: bool,
}

impl BuyAndHold {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            entered: false,
        }
    }
}

impl Strategy for BuyAndHold {
    fn on_bar(
        &mut self,
        bar: &Bar,
        _feed: &BarFeed,
        broker: &mut Broker,
    ) -> Result<(), EngineError> {
        if !self.entered {
            broker.buy_max(bar.date, &self.symbol, bar.open)?;
            self.entered = true;
        }
        Ok(())
    }
}

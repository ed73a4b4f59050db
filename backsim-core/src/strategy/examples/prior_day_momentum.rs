//! Prior-day momentum: enter after a strong session, exit after a weak one.

use crate::broker::Broker;
use crate::domain::Bar;
use crate::engine::EngineError;
use crate::feed::BarFeed;
use crate::strategy::Strategy;

/// Single-symbol momentum rule over the prior session's percent change:
/// a move at or above the entry threshold targets a 100% position at the
/// open; a move at or below the exit threshold closes it. Anything in
/// between holds the current state.
#[derive(Debug, Clone)]
pub struct PriorDayMomentum {
    symbol: String,
    entry_threshold: f64,
    exit_threshold: f64,
}

impl PriorDayMomentum {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            entry_threshold: 1.0,
            exit_threshold: -1.0,
        }
    }

    pub fn with_thresholds(mut self, entry: f64, exit: f64) -> Self {
        self.entry_threshold = entry;
        self.exit_threshold = exit;
        self
    }
}

impl Strategy for PriorDayMomentum {
    fn on_bar(
        &mut self,
        bar: &Bar,
        feed: &BarFeed,
        broker: &mut Broker,
    ) -> Result<(), EngineError> {
        let Some(prev) = feed.previous()? else {
            return Ok(());
        };
        let Some(change) = prev.pct_chg else {
            return Ok(());
        };
        if change >= self.entry_threshold {
            let equity = broker.total_equity();
            broker.order_target_percent(bar.date, &self.symbol, bar.open, 1.0, equity)?;
        } else if change <= self.exit_threshold {
            broker.close(bar.date, &self.symbol, bar.open)?;
        }
        Ok(())
    }
}

//! Strategy contract — pluggable per-bar decision logic.
//!
//! The engine drives a strategy through `on_bar` once per tick, before
//! valuation. The remaining hooks are optional with no-op defaults, so a
//! minimal strategy implements a single method.

pub mod examples;

use crate::broker::Broker;
use crate::domain::Bar;
use crate::engine::EngineError;
use crate::feed::BarFeed;
use std::collections::BTreeMap;

/// Per-bar decision logic invoked by the engine.
///
/// Any error returned from a hook aborts the run immediately and
/// propagates unchanged to the caller; the engine never swallows a
/// partial run.
pub trait Strategy {
    /// Called once after the feed is reset and initial marks are set,
    /// before the first tick.
    fn on_start(&mut self, _feed: &BarFeed, _broker: &mut Broker) -> Result<(), EngineError> {
        Ok(())
    }

    /// Called once per bar, before valuation. May invoke any broker
    /// operation; the engine consumes nothing from it besides the error.
    fn on_bar(
        &mut self,
        bar: &Bar,
        feed: &BarFeed,
        broker: &mut Broker,
    ) -> Result<(), EngineError>;

    /// Symbol → price marks for end-of-bar valuation. An empty map makes
    /// the engine fall back to `{default_symbol: bar.close}`.
    fn mark_prices(
        &mut self,
        _bar: &Bar,
        _feed: &BarFeed,
        _broker: &Broker,
    ) -> BTreeMap<String, f64> {
        BTreeMap::new()
    }

    /// Called once after the last tick.
    fn on_end(&mut self, _feed: &BarFeed, _broker: &mut Broker) -> Result<(), EngineError> {
        Ok(())
    }
}

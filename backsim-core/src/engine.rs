//! Engine — the tick state machine composing feed, broker, and strategy.
//!
//! One pass over the feed, one tick per bar:
//!
//! 1. Read the current bar
//! 2. Invoke `Strategy::on_bar` (side effects on the broker only)
//! 3. Collect valuation marks (strategy marks, or the close fallback)
//! 4. `Broker::update_marks`
//! 5. Append an `EquityPoint`
//! 6. Advance the feed; completed when no bar remains
//!
//! Single-threaded and fully synchronous. A run is not re-entrant: a
//! completed (or failed) engine refuses further `run()` calls; take the
//! pieces back with `into_parts()`, reset the feed, and build a fresh
//! broker to rerun.

use crate::broker::{Broker, BrokerError};
use crate::domain::{Bar, EquityPoint};
use crate::feed::{BarFeed, FeedError};
use crate::strategy::Strategy;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from a simulation run.
///
/// Feed and broker failures convert transparently; strategy-specific
/// failures use the `Strategy` variant. Whatever a strategy callback
/// returns aborts the run immediately and reaches the caller unchanged.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("run() called twice; the engine is single-shot and must be rebuilt to rerun")]
    AlreadyRun,

    #[error("strategy error: {0}")]
    Strategy(String),
}

/// Lifecycle of a single simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Initialized,
    Running,
    Completed,
}

/// Tick-driven simulation over one feed, one broker, one strategy.
pub struct Engine<S: Strategy> {
    feed: BarFeed,
    broker: Broker,
    strategy: S,
    state: RunState,
    equity_curve: Vec<EquityPoint>,
}

impl<S: Strategy> Engine<S> {
    pub fn new(feed: BarFeed, broker: Broker, strategy: S) -> Self {
        Self {
            feed,
            broker,
            strategy,
            state: RunState::Initialized,
            equity_curve: Vec::new(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn feed(&self) -> &BarFeed {
        &self.feed
    }

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Equity points appended so far (one per completed tick).
    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    /// Dismantle the engine, returning feed, broker, and strategy.
    pub fn into_parts(self) -> (BarFeed, Broker, S) {
        (self.feed, self.broker, self.strategy)
    }

    /// Execute the full tick loop and return the equity curve: exactly
    /// one point per bar, in feed order. An empty feed completes with an
    /// empty curve.
    pub fn run(&mut self) -> Result<&[EquityPoint], EngineError> {
        if self.state != RunState::Initialized {
            return Err(EngineError::AlreadyRun);
        }
        self.state = RunState::Running;

        self.feed.reset();
        if self.feed.is_empty() {
            self.state = RunState::Completed;
            return Ok(&self.equity_curve);
        }

        // prime valuation marks from the first bar before any callback runs
        let first = *self.feed.current()?;
        let marks = self.collect_marks(&first);
        self.broker.update_marks(&marks);

        self.strategy.on_start(&self.feed, &mut self.broker)?;

        loop {
            let bar = *self.feed.current()?;
            self.strategy.on_bar(&bar, &self.feed, &mut self.broker)?;
            let marks = self.collect_marks(&bar);
            self.broker.update_marks(&marks);
            self.equity_curve
                .push(EquityPoint::new(bar.date, self.broker.total_equity()));
            if !self.feed.advance() {
                break;
            }
        }

        self.strategy.on_end(&self.feed, &mut self.broker)?;
        self.state = RunState::Completed;
        Ok(&self.equity_curve)
    }

    /// Strategy-supplied marks, or `{default_symbol: bar.close}` when the
    /// strategy provides none.
    fn collect_marks(&mut self, bar: &Bar) -> BTreeMap<String, f64> {
        let mut marks = self.strategy.mark_prices(bar, &self.feed, &self.broker);
        if marks.is_empty() {
            if let Some(symbol) = self.broker.default_symbol() {
                marks.insert(symbol.to_string(), bar.close);
            }
        }
        marks
    }
}

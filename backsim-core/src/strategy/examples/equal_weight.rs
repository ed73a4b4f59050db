//! Periodic equal-weight allocation over a fixed universe.
//!
//! Multi-symbol strategy: the traded universe is priced from a quote
//! table supplied at construction (the bar feed itself only drives the
//! calendar). Rebalances on the first bar of each year bucket and marks
//! open positions from the latest known closes.

use crate::broker::Broker;
use crate::domain::Bar;
use crate::engine::EngineError;
use crate::feed::BarFeed;
use crate::strategy::Strategy;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// One symbol's prices for a single session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub open: f64,
    pub close: f64,
}

/// symbol → date → quote, dates ascending.
pub type QuoteTable = BTreeMap<String, BTreeMap<NaiveDate, Quote>>;

/// Audit entry for one executed rebalance.
#[derive(Debug, Clone)]
pub struct RebalanceRecord {
    pub date: NaiveDate,
    pub targets: Vec<(String, f64)>,
    pub open_prices: BTreeMap<String, f64>,
}

/// Equal-weight rebalance across every symbol with an executable open,
/// once per `interval_years` bucket of the calendar.
#[derive(Debug, Clone)]
pub struct PeriodicEqualWeight {
    quotes: QuoteTable,
    interval_years: i32,
    last_period: Option<i32>,
    history: Vec<RebalanceRecord>,
}

impl PeriodicEqualWeight {
    pub fn new(quotes: QuoteTable) -> Self {
        Self {
            quotes,
            interval_years: 1,
            last_period: None,
            history: Vec::new(),
        }
    }

    pub fn with_interval_years(mut self, years: i32) -> Self {
        self.interval_years = years.max(1);
        self
    }

    /// Rebalances executed so far, in order.
    pub fn history(&self) -> &[RebalanceRecord] {
        &self.history
    }

    fn period_key(&self, date: NaiveDate) -> i32 {
        // bucket years by interval: interval 2 → 2020 and 2021 share one
        date.year().div_euclid(self.interval_years)
    }

    /// Latest quote at or before `date` for a symbol.
    fn latest_quote(&self, symbol: &str, date: NaiveDate) -> Option<Quote> {
        self.quotes
            .get(symbol)?
            .range(..=date)
            .next_back()
            .map(|(_, quote)| *quote)
    }
}

impl Strategy for PeriodicEqualWeight {
    fn on_bar(
        &mut self,
        bar: &Bar,
        _feed: &BarFeed,
        broker: &mut Broker,
    ) -> Result<(), EngineError> {
        let period = self.period_key(bar.date);
        if self.last_period == Some(period) {
            return Ok(());
        }

        let mut opens = BTreeMap::new();
        for symbol in self.quotes.keys() {
            if let Some(quote) = self.latest_quote(symbol, bar.date) {
                if quote.open > 0.0 {
                    opens.insert(symbol.clone(), quote.open);
                }
            }
        }
        if opens.is_empty() {
            return Ok(());
        }

        let weight = 1.0 / opens.len() as f64;
        let targets: Vec<(String, f64)> = opens.keys().map(|s| (s.clone(), weight)).collect();
        broker.rebalance_target_percents(bar.date, &opens, &targets)?;

        self.last_period = Some(period);
        self.history.push(RebalanceRecord {
            date: bar.date,
            targets,
            open_prices: opens,
        });
        Ok(())
    }

    fn mark_prices(
        &mut self,
        bar: &Bar,
        _feed: &BarFeed,
        _broker: &Broker,
    ) -> BTreeMap<String, f64> {
        let mut marks = BTreeMap::new();
        for symbol in self.quotes.keys() {
            if let Some(quote) = self.latest_quote(symbol, bar.date) {
                if quote.close > 0.0 {
                    marks.insert(symbol.clone(), quote.close);
                }
            }
        }
        marks
    }
}

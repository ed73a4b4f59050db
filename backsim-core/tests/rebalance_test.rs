//! Batch rebalance tests: weight targeting, liquidation, sell-first ordering.

use backsim_core::broker::Broker;
use backsim_core::config::BrokerConfig;
use backsim_core::domain::OrderSide;
use backsim_core::engine::Engine;
use backsim_core::feed::BarFeed;
use backsim_core::strategy::examples::{PeriodicEqualWeight, Quote, QuoteTable};
use chrono::NaiveDate;
use std::collections::BTreeMap;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn prices(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(s, p)| (s.to_string(), *p)).collect()
}

fn targets(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
    pairs.iter().map(|(s, w)| (s.to_string(), *w)).collect()
}

#[test]
fn rebalance_reaches_weights_within_unit_tolerance() {
    let mut b = Broker::new(BrokerConfig::frictionless(1_000_000.0)).unwrap();
    let price_map = prices(&[("159922.SZ", 9.97), ("159934.SZ", 25.3), ("159941.SZ", 41.7)]);
    let weights = targets(&[("159922.SZ", 0.3), ("159934.SZ", 0.3), ("159941.SZ", 0.2)]);

    b.rebalance_target_percents(day(2), &price_map, &weights)
        .unwrap();

    let equity = b.total_equity();
    for (symbol, weight) in &weights {
        let price = price_map[symbol];
        let notional = b.holding(symbol) as f64 * price;
        assert!(
            (notional / equity - weight).abs() <= price / equity,
            "{symbol} off target: {} vs {weight}",
            notional / equity
        );
    }
}

#[test]
fn held_symbol_absent_from_targets_is_liquidated() {
    let mut b = Broker::new(BrokerConfig::frictionless(100_000.0)).unwrap();
    b.buy(day(2), "159001.SZ", 10.0, 5_000).unwrap();

    let price_map = prices(&[("159001.SZ", 10.0), ("159922.SZ", 20.0)]);
    b.rebalance_target_percents(day(3), &price_map, &targets(&[("159922.SZ", 0.5)]))
        .unwrap();

    assert!(b.position("159001.SZ").is_none());
    assert_eq!(b.holding("159922.SZ"), 2_500);
}

#[test]
fn zero_weight_target_liquidates_too() {
    let mut b = Broker::new(BrokerConfig::frictionless(100_000.0)).unwrap();
    b.buy(day(2), "159001.SZ", 10.0, 5_000).unwrap();

    let price_map = prices(&[("159001.SZ", 10.0)]);
    b.rebalance_target_percents(day(3), &price_map, &targets(&[("159001.SZ", 0.0)]))
        .unwrap();
    assert!(b.position("159001.SZ").is_none());
}

#[test]
fn sells_execute_before_buys_freeing_cash() {
    // nearly all equity sits in A; the B buy is only fundable after the
    // A liquidation settles
    let mut b = Broker::new(BrokerConfig::new(100_000.0)).unwrap();
    b.buy(day(2), "159001.SZ", 10.0, 9_900).unwrap();
    assert!(b.cash() < 1_000.0);

    let price_map = prices(&[("159001.SZ", 10.0), ("159922.SZ", 20.0)]);
    b.rebalance_target_percents(day(3), &price_map, &targets(&[("159922.SZ", 0.9)]))
        .unwrap();

    let rebalance_fills = &b.trades()[1..];
    assert_eq!(rebalance_fills.len(), 2);
    assert_eq!(rebalance_fills[0].side, OrderSide::Sell);
    assert_eq!(rebalance_fills[0].symbol, "159001.SZ");
    assert_eq!(rebalance_fills[1].side, OrderSide::Buy);
    assert_eq!(rebalance_fills[1].symbol, "159922.SZ");
    // the buy was fully funded by the freed cash
    assert_eq!(rebalance_fills[1].filled, rebalance_fills[1].requested);
    assert!(b.position("159001.SZ").is_none());
    assert!(b.holding("159922.SZ") > 0);
}

#[test]
fn symbol_without_executable_price_is_skipped() {
    let mut b = Broker::new(BrokerConfig::frictionless(100_000.0)).unwrap();
    b.buy(day(2), "159001.SZ", 10.0, 1_000).unwrap();

    // A has no quote today: its position must survive untouched
    let price_map = prices(&[("159922.SZ", 20.0)]);
    b.rebalance_target_percents(day(3), &price_map, &targets(&[("159922.SZ", 0.5)]))
        .unwrap();

    assert_eq!(b.holding("159001.SZ"), 1_000);
    assert!(b.holding("159922.SZ") > 0);
}

#[test]
fn weights_above_one_are_clamped() {
    let mut b = Broker::new(BrokerConfig::frictionless(10_000.0)).unwrap();
    let price_map = prices(&[("159922.SZ", 10.0)]);
    b.rebalance_target_percents(day(2), &price_map, &targets(&[("159922.SZ", 3.0)]))
        .unwrap();
    assert_eq!(b.holding("159922.SZ"), 1_000);
}

// ── periodic equal-weight strategy, end to end ───────────────────────

fn quote_table(symbols: &[&str], dates: &[NaiveDate]) -> QuoteTable {
    let mut table = QuoteTable::new();
    for (i, symbol) in symbols.iter().enumerate() {
        let series: BTreeMap<NaiveDate, Quote> = dates
            .iter()
            .enumerate()
            .map(|(j, &date)| {
                let open = 10.0 + i as f64 * 5.0 + j as f64 * 0.1;
                (
                    date,
                    Quote {
                        open,
                        close: open + 0.05,
                    },
                )
            })
            .collect();
        table.insert(symbol.to_string(), series);
    }
    table
}

#[test]
fn equal_weight_rebalances_once_per_year() {
    let dates: Vec<NaiveDate> = (0..8)
        .map(|i| {
            let (year, month) = if i < 4 { (2022, 3) } else { (2023, 3) };
            NaiveDate::from_ymd_opt(year, month, 1 + i % 4).unwrap()
        })
        .collect();
    let bars: Vec<backsim_core::domain::Bar> = dates
        .iter()
        .map(|&date| backsim_core::domain::Bar {
            date,
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            pct_chg: None,
        })
        .collect();

    let universe = ["159922.SZ", "159934.SZ", "159941.SZ"];
    let strategy = PeriodicEqualWeight::new(quote_table(&universe, &dates));
    let broker = Broker::new(BrokerConfig::frictionless(1_000_000.0)).unwrap();
    let mut engine = Engine::new(BarFeed::new(bars.clone()), broker, strategy);
    let curve = engine.run().unwrap().to_vec();

    assert_eq!(curve.len(), bars.len());
    // one rebalance per calendar year in the feed
    assert_eq!(engine.strategy().history().len(), 2);
    for record in engine.strategy().history() {
        assert_eq!(record.targets.len(), universe.len());
    }
    // every target symbol ends up held
    for symbol in universe {
        assert!(engine.broker().holding(symbol) > 0);
    }
}

//! backsim core — simulation of a trading strategy against historical
//! daily bars, with ledger accounting and performance statistics.
//!
//! This crate contains the heart of the simulator:
//! - Domain types (bars, positions, trade records, equity points)
//! - Cursor-based bar feed with replayable traversal
//! - Broker ledger: cash, weighted-average-cost positions, mark prices,
//!   append-only trade log, explicit transaction-cost model
//! - Bar-by-bar tick loop driving a pluggable strategy
//! - Pure performance statistics over the run outputs
//! - Run fingerprinting for determinism checks
//!
//! Everything is single-threaded and deterministic: the same feed and
//! strategy reproduce the same equity curve and trade log bit for bit.
//! The crate performs no file, network, or process-environment I/O.

pub mod broker;
pub mod config;
pub mod domain;
pub mod engine;
pub mod feed;
pub mod fingerprint;
pub mod stats;
pub mod strategy;

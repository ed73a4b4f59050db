//! Run fingerprinting — deterministic identification of run outputs.
//!
//! Two runs over the same feed with the same strategy must reproduce the
//! equity curve and trade log bit for bit. The fingerprint makes that
//! checkable: canonical serialization → blake3, equal hashes ⇔ equal
//! outputs.

use crate::domain::{EquityPoint, TradeRecord};
use serde::{Deserialize, Serialize};

/// Content hash of one run's outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub equity_hash: String,
    pub trades_hash: String,
}

impl RunFingerprint {
    pub fn of(curve: &[EquityPoint], trades: &[TradeRecord]) -> Self {
        Self {
            equity_hash: hash_of(&curve),
            trades_hash: hash_of(&trades),
        }
    }
}

fn hash_of<T: Serialize>(value: &T) -> String {
    // struct fields serialize in declaration order, so the JSON is canonical
    let json = serde_json::to_string(value).expect("run outputs must serialize");
    blake3::hash(json.as_bytes()).to_hex().to_string()
}

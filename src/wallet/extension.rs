//! Zerocoin bookkeeping records
//!
//! The coin protocol itself lives elsewhere; here each entry is an id the
//! record is keyed by plus the opaque serialized entry.

use serde::Serialize;

/// A minted coin, keyed by its public value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZerocoinEntry {
    /// Big-number bytes of the public coin value
    pub value: Vec<u8>,
    /// Serialized entry
    pub data: Vec<u8>,
}

/// A spent coin, keyed by its serial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoinSpendSerial {
    /// Big-number bytes of the coin serial
    pub serial: Vec<u8>,
    /// Serialized spend entry
    pub data: Vec<u8>,
}

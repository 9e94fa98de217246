//! walletdb - wallet record schema persistence over an ordered key/value store
//!
//! Typed wallet records are encoded into a checksummed append-only store,
//! loaded back through a classifying pipeline, salvaged when damaged and
//! backed up with bounded retention.

pub mod backup;
pub mod cli;
pub mod codec;
pub mod maintenance;
pub mod observability;
pub mod recovery;
pub mod storage;
pub mod wallet;

//! Key/value store adapter for wallet files
//!
//! The wallet layer sees an ordered byte-key store behind [`KvStore`].
//! [`WalletStore`] implements it over an append-only batch file.
//!
//! # Design Principles
//!
//! - Append-only batches, each CRC32-checksummed
//! - A batch is the unit of atomicity (single write or whole transaction)
//! - Strict open halts on any damage
//! - Salvage open keeps every batch that still verifies
//! - fsync before a write is acknowledged

mod batch;
mod errors;
mod reader;
mod store;
mod writer;

pub use batch::{StoreBatch, StoreOp};
pub use errors::{Severity, StoreError, StoreErrorCode, StoreResult};
pub use reader::{SalvageStep, StoreReader};
pub use store::{KvPair, KvStore, SalvagedPairs, StoreCursor, WalletStore};
pub use writer::StoreWriter;

pub(crate) use store::sibling_path;

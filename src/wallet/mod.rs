//! Wallet schema persistence
//!
//! Typed persistence operations over a [`KvStore`](crate::storage::KvStore)
//! and the load pipeline that scans a store into a [`WalletModel`].

mod batch;
mod extension;
mod loader;
mod memory;
mod model;
mod outcome;
mod scan;
mod version;

pub use batch::WalletBatch;
pub use extension::{CoinSpendSerial, ZerocoinEntry};
pub use loader::{read_key_value, LoadReport, ZapReport};
pub use memory::{AddressBookEntry, InMemoryWallet, WalletSummary, MAX_SCRIPT_ELEMENT_SIZE};
pub use model::{ReorderError, WalletModel};
pub use outcome::LoadOutcome;
pub use scan::ScanState;
pub use version::{
    needs_rewrite, CLIENT_VERSION, FEATURE_BASE, FEATURE_LATEST, LEGACY_REWRITE_VERSIONS,
};

//! Recovery of damaged wallet stores
//!
//! A store the load pipeline reports as CORRUPT is rebuilt from whatever
//! still verifies. A [`RecordFilter`] chooses what survives:
//! [`AcceptAll`] for a structural repair, [`KeysOnlyFilter`] for a minimal
//! rescue copy holding only key material.

mod errors;
mod filter;
mod salvage;
mod verify;

pub use errors::{RecoveryError, RecoveryErrorCode, RecoveryResult, Severity};
pub use filter::{AcceptAll, KeysOnlyFilter, RecordFilter};
pub use salvage::{recover, RecoveryReport};
pub use verify::{verify_database_file, verify_environment};

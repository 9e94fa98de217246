//! CLI module for walletdb
//!
//! Provides command-line interface for:
//! - load: Scan the wallet and report the load outcome
//! - verify: Environment check plus automatic salvage of a damaged file
//! - salvage: Rebuild the wallet file, optionally keys only
//! - backup: Timestamped backup with retention
//! - zap-tx: Erase transactions
//! - compact: Rewrite the store without superseded entries
//! - maintain: Load, then flush the wallet once idle

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    backup, compact, load, maintain, run, run_command, salvage, verify, zap_tx,
};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_failure, write_response};

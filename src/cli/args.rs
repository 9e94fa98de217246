//! CLI argument definitions using clap
//!
//! Commands:
//! - walletdb load --config <path>
//! - walletdb verify --config <path>
//! - walletdb salvage --config <path> [--keys-only]
//! - walletdb backup --config <path> [--live]
//! - walletdb zap-tx --config <path> (--all | --hash <hex>...)
//! - walletdb compact --config <path>
//! - walletdb maintain --config <path> [--rounds <n>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// walletdb - wallet record persistence and recovery
#[derive(Parser, Debug)]
#[command(name = "walletdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the wallet and report the outcome
    Load {
        /// Path to configuration file
        #[arg(long, default_value = "./walletdb.json")]
        config: PathBuf,
    },

    /// Check the environment and salvage a damaged wallet file
    Verify {
        /// Path to configuration file
        #[arg(long, default_value = "./walletdb.json")]
        config: PathBuf,
    },

    /// Rebuild the wallet file from what still verifies
    Salvage {
        /// Path to configuration file
        #[arg(long, default_value = "./walletdb.json")]
        config: PathBuf,

        /// Keep only key material and the HD chain
        #[arg(long)]
        keys_only: bool,
    },

    /// Take a backup and apply retention
    Backup {
        /// Path to configuration file
        #[arg(long, default_value = "./walletdb.json")]
        config: PathBuf,

        /// Load the wallet first and back it up live
        #[arg(long)]
        live: bool,
    },

    /// Erase wallet transactions
    ZapTx {
        /// Path to configuration file
        #[arg(long, default_value = "./walletdb.json")]
        config: PathBuf,

        /// Erase every transaction
        #[arg(long, conflicts_with = "hash")]
        all: bool,

        /// Transaction hash to erase (repeatable)
        #[arg(long, num_args = 1.., required_unless_present = "all")]
        hash: Vec<String>,
    },

    /// Rewrite the wallet file without superseded entries
    Compact {
        /// Path to configuration file
        #[arg(long, default_value = "./walletdb.json")]
        config: PathBuf,
    },

    /// Load the wallet, then flush it once it has been idle
    Maintain {
        /// Path to configuration file
        #[arg(long, default_value = "./walletdb.json")]
        config: PathBuf,

        /// Sweeps to run, one stable period apart
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
        rounds: u32,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

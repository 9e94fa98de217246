//! CLI command implementations
//!
//! Every command loads the configuration, does one thing to the wallet
//! file and prints one JSON object.

use std::path::Path;
use std::thread;

use serde_json::{json, Value};

use crate::backup::{backup_file, backup_live, BackupReport};
use crate::codec::{DecodeContext, Hash256};
use crate::observability::{log_event_with_fields, Event};
use crate::recovery::{
    recover, verify_database_file, verify_environment, AcceptAll, KeysOnlyFilter, RecordFilter,
};
use crate::storage::WalletStore;
use crate::wallet::{InMemoryWallet, LoadOutcome, WalletBatch};

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{write_failure, write_response};

/// Parse arguments and run the command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Load { config } => load(&config),
        Command::Verify { config } => verify(&config),
        Command::Salvage { config, keys_only } => salvage(&config, keys_only),
        Command::Backup { config, live } => backup(&config, live),
        Command::ZapTx { config, all, hash } => zap_tx(&config, all, &hash),
        Command::Compact { config } => compact(&config),
        Command::Maintain { config, rounds } => maintain(&config, rounds),
    }
}

/// Scans the wallet into memory and reports the outcome.
///
/// A NEED_REWRITE outcome is handled here: the file is rewritten and scanned
/// again. A fatal outcome prints the report and fails; the caller should
/// salvage.
pub fn load(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let wallet_path = config.wallet_path();
    verify_environment(&wallet_path)?;

    let mut store = WalletStore::open(&wallet_path)?;
    let mut wallet = InMemoryWallet::new();
    let mut report =
        WalletBatch::new(&mut store).load_wallet(&mut wallet, &DecodeContext::default());

    let mut rewritten = false;
    if report.outcome == LoadOutcome::NeedRewrite {
        WalletBatch::new(&mut store).rewrite()?;
        rewritten = true;
        wallet = InMemoryWallet::new();
        report = WalletBatch::new(&mut store).load_wallet(&mut wallet, &DecodeContext::default());
    }

    let data = json!({
        "path": wallet_path.display().to_string(),
        "report": report,
        "rewritten": rewritten,
        "summary": wallet.summary(),
    });

    match report.outcome {
        LoadOutcome::Ok | LoadOutcome::NoncriticalError => write_response(data),
        outcome => {
            write_failure(outcome.as_str(), data)?;
            Err(CliError::load_failed(load_advice(outcome)))
        }
    }
}

fn load_advice(outcome: LoadOutcome) -> String {
    match outcome {
        LoadOutcome::TooNew => "Wallet requires a newer version of this software".to_string(),
        LoadOutcome::NeedRewrite => {
            "Wallet still needs a rewrite after rewriting; salvage it".to_string()
        }
        _ => "Wallet corrupted; run 'walletdb salvage' to recover what is readable".to_string(),
    }
}

/// Checks the environment and salvages a damaged file.
pub fn verify(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let wallet_path = config.wallet_path();

    verify_environment(&wallet_path)?;
    let warning = verify_database_file(&wallet_path)?;

    write_response(json!({
        "path": wallet_path.display().to_string(),
        "warning": warning,
    }))
}

/// Rebuilds the wallet file, optionally keeping only keys.
pub fn salvage(config_path: &Path, keys_only: bool) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let wallet_path = config.wallet_path();

    let mut filter: Box<dyn RecordFilter> = if keys_only {
        Box::new(KeysOnlyFilter::new())
    } else {
        Box::new(AcceptAll)
    };
    let report = recover(&wallet_path, filter.as_mut())?;

    write_response(json!({
        "path": wallet_path.display().to_string(),
        "keys_only": keys_only,
        "report": report,
    }))
}

/// Takes one backup and applies retention.
pub fn backup(config_path: &Path, live: bool) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let wallet_path = config.wallet_path();
    let policy = config.backup_policy();

    let report: BackupReport = if live {
        let mut store = WalletStore::open(&wallet_path)?;
        let mut wallet = InMemoryWallet::new();
        let load =
            WalletBatch::new(&mut store).load_wallet(&mut wallet, &DecodeContext::default());
        if load.outcome.is_fatal() {
            return Err(CliError::load_failed(load_advice(load.outcome)));
        }
        backup_live(&policy, &mut store, &mut wallet, &config.backups_path())
    } else {
        backup_file(&policy, &wallet_path, &config.backups_path())
    };

    let data = json!({
        "report": report,
        "policy": policy.state(),
    });
    match &report.error {
        None => write_response(data),
        Some(error) => {
            write_failure("WALLET_BACKUP_FAILED", data)?;
            Err(CliError::io_error(error.clone()))
        }
    }
}

/// Erases all transactions or the listed ones.
pub fn zap_tx(config_path: &Path, all: bool, hashes: &[String]) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let mut store = WalletStore::open(&config.wallet_path())?;
    let mut batch = WalletBatch::new(&mut store);

    if all {
        let removed = batch
            .zap_wallet_tx()
            .map_err(|outcome| CliError::load_failed(load_advice(outcome)))?;
        let hashes: Vec<Value> = removed
            .iter()
            .map(|wtx| json!(wtx.hash().to_string()))
            .collect();
        return write_response(json!({ "erased": hashes }));
    }

    let targets = hashes
        .iter()
        .map(|s| {
            s.parse::<Hash256>()
                .map_err(|e| CliError::invalid_argument(format!("Invalid hash: {}", e)))
        })
        .collect::<CliResult<Vec<_>>>()?;

    let report = batch.zap_select_tx(&targets);
    if report.outcome != LoadOutcome::Ok {
        write_failure(report.outcome.as_str(), json!(report))?;
        return Err(CliError::load_failed(load_advice(report.outcome)));
    }
    write_response(json!(report))
}

/// Rewrites the store as a single batch.
pub fn compact(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let wallet_path = config.wallet_path();
    let mut store = WalletStore::open(&wallet_path)?;

    let superseded = store.superseded_ops();
    store.compact()?;
    log_event_with_fields(
        Event::CompactComplete,
        &[
            ("path", &wallet_path.display().to_string()),
            ("dropped_ops", &superseded.to_string()),
        ],
    );

    write_response(json!({
        "path": wallet_path.display().to_string(),
        "records": store.len(),
        "dropped_ops": superseded,
    }))
}

/// Loads the wallet, then runs the flush sweep `rounds` times.
///
/// Rounds are one stable period apart, so writes made by the load (version
/// stamp, legacy tx rewrites) are flushed by the last round.
pub fn maintain(config_path: &Path, rounds: u32) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let wallet_path = config.wallet_path();
    let mut store = WalletStore::open(&wallet_path)?;

    let mut wallet = InMemoryWallet::new();
    let load = WalletBatch::new(&mut store).load_wallet(&mut wallet, &DecodeContext::default());
    if load.outcome.is_fatal() {
        return Err(CliError::load_failed(load_advice(load.outcome)));
    }

    let sweep = config.maintenance_sweep();
    let mut sweeps = Vec::new();
    for round in 0..rounds {
        if round > 0 {
            thread::sleep(sweep.stable_after());
        }
        sweeps.push(sweep.run(&mut [&mut store]));
    }

    write_response(json!({
        "path": wallet_path.display().to_string(),
        "load": load.outcome.as_str(),
        "sweeps": sweeps,
    }))
}

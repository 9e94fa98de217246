//! Configuration file
//!
//! ```json
//! {
//!   "data_dir": "/var/lib/walletdb",
//!   "wallet_file": "wallet.dat",
//!   "wallet_backups": 10,
//!   "flush_wallet": true
//! }
//! ```
//!
//! Only `data_dir` is required.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backup::{BackupPolicy, MAX_BACKUPS};
use crate::maintenance::MaintenanceSweep;
use crate::observability::{log_event_with_fields, Event};

use super::errors::{CliError, CliResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Wallet file name inside `data_dir` (default "wallet.dat")
    #[serde(default = "default_wallet_file")]
    pub wallet_file: String,

    /// Backup directory (default `<data_dir>/backups`)
    #[serde(default)]
    pub backups_dir: Option<String>,

    /// Number of automatic backups to keep; 0 turns them off
    #[serde(default = "default_wallet_backups")]
    pub wallet_backups: i32,

    /// Periodic flush of idle wallets
    #[serde(default = "default_flush_wallet")]
    pub flush_wallet: bool,

    /// Seconds without updates before a wallet is flushed
    #[serde(default = "default_flush_stable_secs")]
    pub flush_stable_secs: u64,
}

fn default_wallet_file() -> String {
    "wallet.dat".to_string()
}
fn default_wallet_backups() -> i32 {
    MAX_BACKUPS
}
fn default_flush_wallet() -> bool {
    true
}
fn default_flush_stable_secs() -> u64 {
    2
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config = Self::from_json(&content)?;
        log_event_with_fields(Event::ConfigLoaded, &[("data_dir", &config.data_dir)]);
        Ok(config)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(json: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        let file = Path::new(&self.wallet_file);
        if self.wallet_file.is_empty() || file.file_name() != Some(file.as_os_str()) {
            return Err(CliError::config_error(format!(
                "Invalid wallet_file: '{}'. Must be a plain file name.",
                self.wallet_file
            )));
        }

        if !(0..=MAX_BACKUPS).contains(&self.wallet_backups) {
            return Err(CliError::config_error(format!(
                "wallet_backups must be between 0 and {}, got {}",
                MAX_BACKUPS, self.wallet_backups
            )));
        }

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    pub fn wallet_path(&self) -> PathBuf {
        self.data_path().join(&self.wallet_file)
    }

    pub fn backups_path(&self) -> PathBuf {
        match &self.backups_dir {
            Some(dir) => PathBuf::from(dir),
            None => self.data_path().join("backups"),
        }
    }

    pub fn backup_policy(&self) -> BackupPolicy {
        BackupPolicy::new(self.wallet_backups)
    }

    pub fn maintenance_sweep(&self) -> MaintenanceSweep {
        MaintenanceSweep::new(
            self.flush_wallet,
            Duration::from_secs(self.flush_stable_secs),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_json(r#"{"data_dir": "/data"}"#).unwrap();
        assert_eq!(config.wallet_file, "wallet.dat");
        assert_eq!(config.wallet_backups, 10);
        assert!(config.flush_wallet);
        assert_eq!(config.flush_stable_secs, 2);
        assert_eq!(config.wallet_path(), PathBuf::from("/data/wallet.dat"));
        assert_eq!(config.backups_path(), PathBuf::from("/data/backups"));
    }

    #[test]
    fn test_explicit_backups_dir() {
        let config =
            Config::from_json(r#"{"data_dir": "/data", "backups_dir": "/mnt/b"}"#).unwrap();
        assert_eq!(config.backups_path(), PathBuf::from("/mnt/b"));
    }

    #[test]
    fn test_retention_out_of_range_rejected() {
        for value in [-1, 11] {
            let json = format!(r#"{{"data_dir": "/data", "wallet_backups": {}}}"#, value);
            let err = Config::from_json(&json).unwrap_err();
            assert_eq!(err.code_str(), "WALLET_CLI_CONFIG_ERROR");
        }
        assert!(Config::from_json(r#"{"data_dir": "/data", "wallet_backups": 0}"#).is_ok());
    }

    #[test]
    fn test_wallet_file_must_be_plain_name() {
        assert!(Config::from_json(r#"{"data_dir": "/d", "wallet_file": "../w.dat"}"#).is_err());
        assert!(Config::from_json(r#"{"data_dir": "/d", "wallet_file": ""}"#).is_err());
    }

    #[test]
    fn test_flush_wallet_false_disables_sweep() {
        let config = Config::from_json(r#"{"data_dir": "/d", "flush_wallet": false}"#).unwrap();
        assert!(!config.maintenance_sweep().run(&mut []).ran);
        assert!(config.backup_policy().is_enabled());
    }

    #[test]
    fn test_missing_data_dir_rejected() {
        assert!(Config::from_json(r#"{"wallet_file": "w.dat"}"#).is_err());
        assert!(Config::from_json(r#"{"data_dir": " "}"#).is_err());
    }
}

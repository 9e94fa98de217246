//! Pre-load checks on the wallet environment and file

use std::path::Path;

use crate::storage::WalletStore;

use super::errors::{RecoveryError, RecoveryResult};
use super::filter::AcceptAll;
use super::salvage::recover;

/// Checks that the directory holding `wallet_path` exists.
pub fn verify_environment(wallet_path: &Path) -> RecoveryResult<()> {
    let dir = match wallet_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => return Ok(()),
    };
    if !dir.is_dir() {
        return Err(RecoveryError::environment(format!(
            "Wallet directory {} does not exist or is not a directory",
            dir.display()
        )));
    }
    Ok(())
}

/// Opens the wallet file and salvages it if the store is damaged.
///
/// Returns a warning when a salvage ran. A missing file is fine: it is
/// created on first load.
pub fn verify_database_file(wallet_path: &Path) -> RecoveryResult<Option<String>> {
    if !wallet_path.exists() {
        return Ok(None);
    }

    match WalletStore::open(wallet_path) {
        Ok(_) => Ok(None),
        Err(e) if e.is_fatal() => {
            let report = recover(wallet_path, &mut AcceptAll)?;
            Ok(Some(format!(
                "Wallet file corrupt, data salvaged. Original saved as {}; {} records kept, {} damaged batches lost",
                report.backup_path.display(),
                report.kept,
                report.damaged_batches
            )))
        }
        Err(e) => Err(RecoveryError::salvage_failed(
            format!("Failed to open {}", wallet_path.display()),
            &e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::RecoveryErrorCode;
    use crate::storage::KvStore;
    use std::fs::{self, OpenOptions};
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_environment_missing_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent").join("wallet.dat");
        let err = verify_environment(&path).unwrap_err();
        assert_eq!(err.code(), RecoveryErrorCode::Environment);
        assert!(verify_environment(&dir.path().join("wallet.dat")).is_ok());
    }

    #[test]
    fn test_missing_and_healthy_files_pass() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wallet.dat");
        assert_eq!(verify_database_file(&path).unwrap(), None);

        WalletStore::open(&path).unwrap().write(b"k", b"v", true).unwrap();
        assert_eq!(verify_database_file(&path).unwrap(), None);
    }

    #[test]
    fn test_damaged_file_is_salvaged_with_warning() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wallet.dat");
        WalletStore::open(&path).unwrap().write(b"k", b"v", true).unwrap();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[0x00, 0x13, 0x37]).unwrap();
        drop(file);

        let warning = verify_database_file(&path).unwrap().unwrap();
        assert!(warning.contains(".bak"));
        assert!(WalletStore::open(&path).is_ok());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}

//! Schema version constants

/// Oldest wallet feature level still understood.
pub const FEATURE_BASE: i32 = 10500;

/// Newest feature level this build can read. A `minversion` above this
/// means the file was written by newer software.
pub const FEATURE_LATEST: i32 = 169_900;

/// Version stamped into the file after a successful load.
pub const CLIENT_VERSION: i32 = 170_000;

/// File versions of encrypted wallets that must be fully rewritten.
pub const LEGACY_REWRITE_VERSIONS: [i32; 2] = [40_000, 50_000];

/// True if an encrypted wallet at `version` needs a rewrite pass.
pub fn needs_rewrite(is_encrypted: bool, version: i32) -> bool {
    is_encrypted && LEGACY_REWRITE_VERSIONS.contains(&version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_only_for_encrypted_legacy_versions() {
        assert!(needs_rewrite(true, 40_000));
        assert!(needs_rewrite(true, 50_000));
        assert!(!needs_rewrite(false, 40_000));
        assert!(!needs_rewrite(true, 60_000));
    }

    #[test]
    fn test_version_ordering() {
        assert!(FEATURE_BASE < FEATURE_LATEST);
        assert!(FEATURE_LATEST < CLIENT_VERSION);
    }
}

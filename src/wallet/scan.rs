//! Per-load scan accumulator

use std::collections::BTreeSet;

use crate::codec::Hash256;

/// State gathered during one pass over the store and consulted when the
/// pass finishes. Discarded afterwards.
#[derive(Debug, Default, Clone)]
pub struct ScanState {
    pub plaintext_keys: u32,
    pub encrypted_keys: u32,
    pub watch_keys: u32,
    pub key_meta: u32,
    pub unknown_records: u32,
    pub is_encrypted: bool,
    pub any_unordered: bool,
    pub file_version: i32,
    /// Legacy-format transactions to re-persist, in scan order.
    pub wallet_upgrade: Vec<Hash256>,
    master_key_ids: BTreeSet<u32>,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a master key id. Returns false if it was already seen.
    pub fn note_master_key(&mut self, id: u32) -> bool {
        self.master_key_ids.insert(id)
    }

    pub fn has_master_key(&self, id: u32) -> bool {
        self.master_key_ids.contains(&id)
    }

    /// Highest master key id seen, if any.
    pub fn master_key_max_id(&self) -> Option<u32> {
        self.master_key_ids.iter().next_back().copied()
    }

    /// Keys that carry (or should carry) a metadata row.
    pub fn total_keys(&self) -> u32 {
        self.plaintext_keys + self.encrypted_keys + self.watch_keys
    }

    /// First-key time is only trustworthy when every key had metadata.
    pub fn key_metadata_complete(&self) -> bool {
        self.total_keys() == self.key_meta
    }
}

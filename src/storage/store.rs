//! Ordered key/value store over the batch file
//!
//! The live state is an ordered map rebuilt by replaying every batch on
//! open. Writes are applied to the map and appended to the file as a batch;
//! inside a transaction they are held back and appended as one batch on
//! commit.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::batch::{StoreBatch, StoreOp, MAX_BATCH_SIZE};
use super::errors::{StoreError, StoreResult};
use super::reader::{SalvageStep, StoreReader};
use super::writer::StoreWriter;

/// One raw key/value pair.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Forward cursor over raw pairs in key order.
pub type StoreCursor<'a> = Box<dyn Iterator<Item = StoreResult<KvPair>> + 'a>;

/// Ordered byte-key store used by the wallet layer.
pub trait KvStore {
    /// Point read.
    fn read(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Returns whether the key is present.
    fn exists(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.read(key)?.is_some())
    }

    /// Writes a value. With `overwrite == false` an existing key is an error.
    fn write(&mut self, key: &[u8], value: &[u8], overwrite: bool) -> StoreResult<()>;

    /// Removes a key. Erasing an absent key succeeds.
    fn erase(&mut self, key: &[u8]) -> StoreResult<()>;

    /// Cursor from the first key.
    fn cursor(&self) -> StoreResult<StoreCursor<'_>>;

    /// Cursor from the first key `>= start`.
    fn cursor_from(&self, start: &[u8]) -> StoreResult<StoreCursor<'_>>;

    fn txn_begin(&mut self) -> StoreResult<()>;
    fn txn_commit(&mut self) -> StoreResult<()>;
    fn txn_abort(&mut self) -> StoreResult<()>;

    /// Number of committed writes since open.
    fn update_counter(&self) -> u64;
}

/// Pairs recovered from a damaged file.
#[derive(Debug, Default)]
pub struct SalvagedPairs {
    pub pairs: Vec<KvPair>,
    /// Batches that failed verification and were stepped over
    pub skipped_batches: u64,
    /// Bytes abandoned after the last parseable frame
    pub trailing_bytes: u64,
}

impl SalvagedPairs {
    /// Returns true if the scan saw no damage at all.
    pub fn is_clean(&self) -> bool {
        self.skipped_batches == 0 && self.trailing_bytes == 0
    }
}

#[derive(Debug, Default)]
struct PendingTxn {
    ops: Vec<StoreOp>,
    undo: Vec<(Vec<u8>, Option<Vec<u8>>)>,
}

/// File-backed ordered key/value store.
pub struct WalletStore {
    path: PathBuf,
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    writer: StoreWriter,
    txn: Option<PendingTxn>,
    update_counter: u64,
    superseded_ops: u64,
    handle_id: Uuid,
}

impl WalletStore {
    /// Opens or creates a store, replaying the file in strict mode.
    ///
    /// Any damage in the file is a FATAL corruption error.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let mut entries = BTreeMap::new();
        let mut superseded_ops = 0;

        if path.exists() {
            let mut reader = StoreReader::open(path)?;
            while let Some(batch) = reader.read_next()? {
                for op in batch.ops {
                    if apply_op(&mut entries, op).is_some() {
                        superseded_ops += 1;
                    }
                }
            }
        }

        let writer = StoreWriter::open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            writer,
            txn: None,
            update_counter: 0,
            superseded_ops,
            handle_id: Uuid::new_v4(),
        })
    }

    /// Reads a possibly damaged file in salvage mode.
    ///
    /// Verified batches are replayed in order; the resulting live pairs are
    /// returned in key order.
    pub fn salvage(path: &Path) -> StoreResult<SalvagedPairs> {
        let mut reader = StoreReader::open(path)?;
        let mut entries = BTreeMap::new();
        let mut salvaged = SalvagedPairs::default();

        loop {
            match reader.salvage_next()? {
                SalvageStep::Batch(batch) => {
                    for op in batch.ops {
                        apply_op(&mut entries, op);
                    }
                }
                SalvageStep::Skipped { .. } => salvaged.skipped_batches += 1,
                SalvageStep::End { trailing } => {
                    salvaged.trailing_bytes = trailing;
                    break;
                }
            }
        }

        salvaged.pairs = entries.into_iter().collect();
        Ok(salvaged)
    }

    /// Writes `pairs` into a fresh file at `path`.
    ///
    /// Pairs are packed into as few batches as the frame limit allows.
    pub fn create_from_pairs<I>(path: &Path, pairs: I) -> StoreResult<u64>
    where
        I: IntoIterator<Item = KvPair>,
    {
        let ops: Vec<StoreOp> = pairs
            .into_iter()
            .map(|(key, value)| StoreOp::Put { key, value })
            .collect();
        let count = ops.len() as u64;
        let batches =
            StoreBatch::pack(ops, MAX_BATCH_SIZE).map_err(StoreError::batch_too_large)?;

        let mut writer = StoreWriter::create_truncated(path)?;
        for batch in &batches {
            writer.append(batch)?;
        }
        if batches.is_empty() {
            writer.sync()?;
        }
        Ok(count)
    }

    /// Returns the store file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifies this open handle. The update counter restarts at zero
    /// with every open, so counters are only comparable under one id.
    pub fn handle_id(&self) -> Uuid {
        self.handle_id
    }

    /// Number of on-disk ops that no longer contribute to the live state.
    pub fn superseded_ops(&self) -> u64 {
        self.superseded_ops
    }

    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }

    /// Rewrites the live state into a fresh file and swaps it into place.
    ///
    /// Refused while a transaction is open.
    pub fn compact(&mut self) -> StoreResult<()> {
        self.compact_retaining(|_| true).map(|_| ())
    }

    /// Like [`compact`](Self::compact), dropping every key `keep` rejects.
    ///
    /// Dropped keys leave the live state only once the new file is in
    /// place. Returns the number of keys dropped.
    pub fn compact_retaining<F>(&mut self, mut keep: F) -> StoreResult<u64>
    where
        F: FnMut(&[u8]) -> bool,
    {
        if self.txn.is_some() {
            return Err(StoreError::transaction("Cannot compact inside a transaction"));
        }

        let dropped: Vec<Vec<u8>> = self
            .entries
            .keys()
            .filter(|k| !keep(k))
            .cloned()
            .collect();

        let tmp_path = sibling_path(&self.path, "compact.tmp");
        let pairs = self
            .entries
            .iter()
            .filter(|(k, _)| dropped.binary_search(k).is_err())
            .map(|(k, v)| (k.clone(), v.clone()));
        if let Err(e) = Self::create_from_pairs(&tmp_path, pairs) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::io_error(
                format!("Failed to replace store file: {}", self.path.display()),
                e,
            )
        })?;

        for key in &dropped {
            self.entries.remove(key);
        }
        self.writer = StoreWriter::open(&self.path)?;
        self.superseded_ops = 0;
        Ok(dropped.len() as u64)
    }

    /// fsync the store file.
    pub fn sync(&self) -> StoreResult<()> {
        self.writer.sync()
    }

    fn commit_ops(&mut self, ops: Vec<StoreOp>) -> StoreResult<()> {
        if ops.is_empty() {
            return Ok(());
        }
        let count = ops.len() as u64;
        self.writer.append(&StoreBatch::new(ops))?;
        self.update_counter += count;
        Ok(())
    }

    fn mutate(&mut self, op: StoreOp) -> StoreResult<()> {
        let key = op.key().to_vec();
        let previous = self.entries.get(&key).cloned();

        match self.txn.as_mut() {
            Some(txn) => {
                txn.undo.push((key, previous.clone()));
                txn.ops.push(op.clone());
            }
            None => self.commit_ops(vec![op.clone()])?,
        }

        if apply_op(&mut self.entries, op).is_some() {
            self.superseded_ops += 1;
        }
        Ok(())
    }
}

impl KvStore for WalletStore {
    fn read(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &[u8], value: &[u8], overwrite: bool) -> StoreResult<()> {
        if !overwrite && self.entries.contains_key(key) {
            return Err(StoreError::key_exists(key));
        }
        self.mutate(StoreOp::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        })
    }

    fn erase(&mut self, key: &[u8]) -> StoreResult<()> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }
        self.mutate(StoreOp::Erase { key: key.to_vec() })
    }

    fn cursor(&self) -> StoreResult<StoreCursor<'_>> {
        Ok(Box::new(
            self.entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), v.clone()))),
        ))
    }

    fn cursor_from(&self, start: &[u8]) -> StoreResult<StoreCursor<'_>> {
        Ok(Box::new(
            self.entries
                .range(start.to_vec()..)
                .map(|(k, v)| Ok((k.clone(), v.clone()))),
        ))
    }

    fn txn_begin(&mut self) -> StoreResult<()> {
        if self.txn.is_some() {
            return Err(StoreError::transaction("Transaction already open"));
        }
        self.txn = Some(PendingTxn::default());
        Ok(())
    }

    fn txn_commit(&mut self) -> StoreResult<()> {
        let txn = self
            .txn
            .take()
            .ok_or_else(|| StoreError::transaction("Commit without open transaction"))?;

        if let Err(e) = self.commit_ops(txn.ops) {
            rollback(&mut self.entries, txn.undo);
            return Err(e);
        }
        Ok(())
    }

    fn txn_abort(&mut self) -> StoreResult<()> {
        let txn = self
            .txn
            .take()
            .ok_or_else(|| StoreError::transaction("Abort without open transaction"))?;
        rollback(&mut self.entries, txn.undo);
        Ok(())
    }

    fn update_counter(&self) -> u64 {
        self.update_counter
    }
}

/// Applies an op to the map, returning the replaced value if any.
fn apply_op(entries: &mut BTreeMap<Vec<u8>, Vec<u8>>, op: StoreOp) -> Option<Vec<u8>> {
    match op {
        StoreOp::Put { key, value } => entries.insert(key, value),
        StoreOp::Erase { key } => entries.remove(&key),
    }
}

fn rollback(entries: &mut BTreeMap<Vec<u8>, Vec<u8>>, undo: Vec<(Vec<u8>, Option<Vec<u8>>)>) {
    for (key, previous) in undo.into_iter().rev() {
        match previous {
            Some(value) => {
                entries.insert(key, value);
            }
            None => {
                entries.remove(&key);
            }
        }
    }
}

/// `<dir>/<file name>.<suffix>`
pub(crate) fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}.{}", name, suffix))
}

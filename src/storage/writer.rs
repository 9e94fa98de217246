//! Append-only batch writer with fsync enforcement
//!
//! A batch is acknowledged only after write and fsync both succeed.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::batch::StoreBatch;
use super::errors::{StoreError, StoreResult};

/// Writer appending batches to the store file.
pub struct StoreWriter {
    path: PathBuf,
    file: File,
    current_offset: u64,
}

impl StoreWriter {
    /// Opens or creates the store file for appending.
    ///
    /// Creates parent directories if needed.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::open_with(path, false)
    }

    /// Creates the store file, discarding any existing content.
    pub fn create_truncated(path: &Path) -> StoreResult<Self> {
        Self::open_with(path, true)
    }

    fn open_with(path: &Path, truncate: bool) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    StoreError::write_failed(
                        format!("Failed to create directory: {}", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let mut options = OpenOptions::new();
        options.create(true);
        if truncate {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }

        let file = options.open(path).map_err(|e| {
            StoreError::write_failed(format!("Failed to open store file: {}", path.display()), e)
        })?;

        let current_offset = file
            .metadata()
            .map_err(|e| StoreError::write_failed("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            current_offset,
        })
    }

    /// Returns the path to the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current file offset.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Appends a batch and fsyncs.
    ///
    /// Returns the byte offset where the batch starts. An oversized batch
    /// is refused before anything touches the file.
    pub fn append(&mut self, batch: &StoreBatch) -> StoreResult<u64> {
        let serialized = batch.serialize().map_err(StoreError::batch_too_large)?;
        let offset = self.current_offset;

        self.file.write_all(&serialized).map_err(|e| {
            StoreError::write_failed(format!("Failed to append batch at offset {}", offset), e)
        })?;

        self.sync()?;

        self.current_offset += serialized.len() as u64;
        Ok(offset)
    }

    /// fsync the underlying file.
    pub fn sync(&self) -> StoreResult<()> {
        self.file.sync_all().map_err(|e| {
            StoreError::write_failed(format!("fsync failed: {}", self.path.display()), e)
        })
    }
}

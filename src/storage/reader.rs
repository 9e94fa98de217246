//! Sequential batch reader for the wallet store file
//!
//! Two modes:
//! - strict: every batch must verify; the first bad one is a FATAL error
//! - salvage: batches that fail their checksum but have a plausible length
//!   are skipped, the scan stops at the first unparseable length

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::batch::{StoreBatch, MAX_BATCH_SIZE, MIN_BATCH_SIZE};
use super::errors::{StoreError, StoreResult};

/// Result of one salvage step.
#[derive(Debug)]
pub enum SalvageStep {
    /// A batch verified and was decoded
    Batch(StoreBatch),
    /// A batch failed verification and was stepped over
    Skipped { offset: u64, reason: String },
    /// End of readable data; `trailing` is the number of bytes abandoned
    End { trailing: u64 },
}

/// Batch reader over a store file.
pub struct StoreReader {
    path: PathBuf,
    reader: BufReader<File>,
    current_offset: u64,
    file_size: u64,
}

impl StoreReader {
    /// Opens the store file for reading.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let file = File::open(path).map_err(|e| {
            StoreError::read_failed(format!("Failed to open store file: {}", path.display()), e)
        })?;

        let file_size = file
            .metadata()
            .map_err(|e| StoreError::read_failed("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            current_offset: 0,
            file_size,
        })
    }

    /// Returns the store file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current read offset.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Reads the next batch, failing on any damage.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(batch))` if a batch was read
    /// - `Ok(None)` at end of file
    /// - `Err(WALLET_STORE_CORRUPTION)` on framing or checksum failure
    pub fn read_next(&mut self) -> StoreResult<Option<StoreBatch>> {
        if self.current_offset >= self.file_size {
            return Ok(None);
        }

        let buf = self.read_frame()?;
        let (batch, consumed) = StoreBatch::deserialize(&buf)
            .map_err(|e| StoreError::corruption_at_offset(self.current_offset, e.to_string()))?;
        self.current_offset += consumed as u64;
        Ok(Some(batch))
    }

    /// Reads every batch in strict mode.
    pub fn read_all(&mut self) -> StoreResult<Vec<StoreBatch>> {
        let mut batches = Vec::new();
        while let Some(batch) = self.read_next()? {
            batches.push(batch);
        }
        Ok(batches)
    }

    /// Advances one step in salvage mode.
    ///
    /// Never returns a corruption error; I/O errors from the OS still
    /// propagate.
    pub fn salvage_next(&mut self) -> StoreResult<SalvageStep> {
        let remaining = self.file_size.saturating_sub(self.current_offset);
        if remaining == 0 {
            return Ok(SalvageStep::End { trailing: 0 });
        }

        let buf = match self.read_frame() {
            Ok(buf) => buf,
            Err(e) if e.is_fatal() => return Ok(SalvageStep::End { trailing: remaining }),
            Err(e) => return Err(e),
        };

        let offset = self.current_offset;
        self.current_offset += buf.len() as u64;

        match StoreBatch::deserialize(&buf) {
            Ok((batch, _)) => Ok(SalvageStep::Batch(batch)),
            Err(e) => Ok(SalvageStep::Skipped {
                offset,
                reason: e.to_string(),
            }),
        }
    }

    /// Reads one length-delimited frame without verifying its checksum.
    fn read_frame(&mut self) -> StoreResult<Vec<u8>> {
        let remaining = self.file_size - self.current_offset;

        if remaining < MIN_BATCH_SIZE as u64 {
            return Err(StoreError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Truncated store: {} bytes remaining, minimum batch size is {}",
                    remaining, MIN_BATCH_SIZE
                ),
            ));
        }

        let mut len_buf = [0u8; 4];
        self.reader
            .read_exact(&mut len_buf)
            .map_err(|e| StoreError::read_failed("Failed to read batch length", e))?;
        let batch_length = u32::from_le_bytes(len_buf) as u64;

        if batch_length < MIN_BATCH_SIZE as u64 || batch_length > MAX_BATCH_SIZE as u64 {
            return Err(StoreError::corruption_at_offset(
                self.current_offset,
                format!("Invalid batch length: {}", batch_length),
            ));
        }

        if batch_length > remaining {
            return Err(StoreError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Batch length {} exceeds remaining file size {}",
                    batch_length, remaining
                ),
            ));
        }

        let mut buf = vec![0u8; batch_length as usize];
        buf[0..4].copy_from_slice(&len_buf);
        self.reader
            .read_exact(&mut buf[4..])
            .map_err(|e| StoreError::read_failed("Failed to read batch body", e))?;

        Ok(buf)
    }
}

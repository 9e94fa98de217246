//! On-disk batch framing for the wallet store
//!
//! The store file is a sequence of batches. A batch is the unit of
//! atomicity: a single committed write is a one-op batch, a committed
//! transaction is one batch holding all of its ops.
//!
//! ```text
//! +------------------+
//! | Batch Length     | (u32 LE, includes itself and the checksum)
//! +------------------+
//! | Op Count         | (u32 LE)
//! +------------------+
//! | Op 0 .. Op N-1   |
//! +------------------+
//! | Checksum         | (u32 LE, CRC32 over everything before it)
//! +------------------+
//!
//! Op:
//! | Kind (u8: 0 = put, 1 = erase) | Key (u32-prefixed) | Value (u32-prefixed) |
//! ```

use std::io::{self, Cursor, Read};

use crc32fast::Hasher;

/// Length field + op count + checksum
pub const MIN_BATCH_SIZE: usize = 4 + 4 + 4;

/// Upper bound used to reject garbage length fields before allocating.
pub const MAX_BATCH_SIZE: usize = 64 * 1024 * 1024;

/// Kind byte plus the two length prefixes.
const OP_OVERHEAD: usize = 1 + 4 + 4;

const OP_PUT: u8 = 0;
const OP_ERASE: u8 = 1;

/// CRC32 (IEEE) over a batch body.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// A single mutation inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// Insert or replace a key
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Remove a key
    Erase { key: Vec<u8> },
}

impl StoreOp {
    /// Returns the key this op touches
    pub fn key(&self) -> &[u8] {
        match self {
            StoreOp::Put { key, .. } | StoreOp::Erase { key } => key,
        }
    }

    /// Bytes this op occupies inside a batch body.
    pub fn encoded_len(&self) -> usize {
        match self {
            StoreOp::Put { key, value } => OP_OVERHEAD + key.len() + value.len(),
            StoreOp::Erase { key } => OP_OVERHEAD + key.len(),
        }
    }
}

/// An atomic group of ops as written to disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreBatch {
    pub ops: Vec<StoreOp>,
}

impl StoreBatch {
    pub fn new(ops: Vec<StoreOp>) -> Self {
        Self { ops }
    }

    pub fn single(op: StoreOp) -> Self {
        Self { ops: vec![op] }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Size of the serialized frame, checksum included.
    pub fn encoded_len(&self) -> usize {
        MIN_BATCH_SIZE + self.ops.iter().map(StoreOp::encoded_len).sum::<usize>()
    }

    /// Groups `ops` into consecutive batches whose frames stay within `limit`.
    ///
    /// An op that cannot fit even in a batch of its own is an error.
    pub fn pack(ops: Vec<StoreOp>, limit: usize) -> io::Result<Vec<StoreBatch>> {
        let mut batches = Vec::new();
        let mut current = StoreBatch::default();
        let mut current_len = MIN_BATCH_SIZE;

        for op in ops {
            let op_len = op.encoded_len();
            if MIN_BATCH_SIZE + op_len > limit {
                return Err(oversized(MIN_BATCH_SIZE + op_len, limit));
            }
            if current_len + op_len > limit {
                batches.push(std::mem::take(&mut current));
                current_len = MIN_BATCH_SIZE;
            }
            current_len += op_len;
            current.ops.push(op);
        }

        if !current.is_empty() {
            batches.push(current);
        }
        Ok(batches)
    }

    /// Serialize the batch with length prefix and trailing checksum.
    ///
    /// Frames larger than [`MAX_BATCH_SIZE`] are refused: the reader would
    /// reject them as corruption.
    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let frame_len = self.encoded_len();
        if frame_len > MAX_BATCH_SIZE {
            return Err(oversized(frame_len, MAX_BATCH_SIZE));
        }

        let mut body = Vec::with_capacity(frame_len - 8);
        body.extend_from_slice(&(self.ops.len() as u32).to_le_bytes());

        for op in &self.ops {
            let (kind, key, value): (u8, &[u8], &[u8]) = match op {
                StoreOp::Put { key, value } => (OP_PUT, key, value),
                StoreOp::Erase { key } => (OP_ERASE, key, &[]),
            };
            body.push(kind);
            body.extend_from_slice(&(key.len() as u32).to_le_bytes());
            body.extend_from_slice(key);
            body.extend_from_slice(&(value.len() as u32).to_le_bytes());
            body.extend_from_slice(value);
        }

        // Bounded by MAX_BATCH_SIZE above, so every length fits in a u32.
        let batch_length = (4 + body.len() + 4) as u32;

        let mut out = Vec::with_capacity(frame_len);
        out.extend_from_slice(&batch_length.to_le_bytes());
        out.extend_from_slice(&body);
        let checksum = compute_checksum(&out);
        out.extend_from_slice(&checksum.to_le_bytes());
        Ok(out)
    }

    /// Deserialize one batch from the front of `data`, verifying the checksum.
    ///
    /// Returns the batch and the number of bytes consumed.
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        if data.len() < MIN_BATCH_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Batch too short",
            ));
        }

        let batch_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if !(MIN_BATCH_SIZE..=MAX_BATCH_SIZE).contains(&batch_length) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid batch length: {}", batch_length),
            ));
        }
        if data.len() < batch_length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Batch truncated: expected {} bytes, got {}",
                    batch_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = batch_length - 4;
        let stored = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);
        let computed = compute_checksum(&data[..checksum_offset]);
        if computed != stored {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Checksum mismatch: computed {:08x}, stored {:08x}",
                    computed, stored
                ),
            ));
        }

        let mut cursor = Cursor::new(&data[4..checksum_offset]);
        let op_count = read_u32(&mut cursor)? as usize;
        let mut ops = Vec::with_capacity(op_count.min(1024));

        for _ in 0..op_count {
            let mut kind = [0u8; 1];
            cursor.read_exact(&mut kind)?;
            let key = read_bytes(&mut cursor)?;
            let value = read_bytes(&mut cursor)?;
            let op = match kind[0] {
                OP_PUT => StoreOp::Put { key, value },
                OP_ERASE => StoreOp::Erase { key },
                other => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("Unknown op kind: {}", other),
                    ))
                }
            };
            ops.push(op);
        }

        if cursor.position() as usize != checksum_offset - 4 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Trailing bytes after last op",
            ));
        }

        Ok((Self { ops }, batch_length))
    }
}

fn oversized(len: usize, limit: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("Batch of {} bytes exceeds limit of {}", len, limit),
    )
}

fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let len = read_u32(reader)? as usize;
    if len > MAX_BATCH_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Field length {} exceeds batch limit", len),
        ));
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_batch() -> StoreBatch {
        StoreBatch::new(vec![
            StoreOp::Put {
                key: b"\x04name\x05alice".to_vec(),
                value: b"\x03Bob".to_vec(),
            },
            StoreOp::Erase {
                key: b"\x07purpose\x05alice".to_vec(),
            },
        ])
    }

    #[test]
    fn test_batch_roundtrip() {
        let batch = sample_batch();
        let bytes = batch.serialize().unwrap();
        let (decoded, consumed) = StoreBatch::deserialize(&bytes).unwrap();
        assert_eq!(decoded, batch);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let mut bytes = sample_batch().serialize().unwrap();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xFF;
        let err = StoreBatch::deserialize(&bytes).unwrap_err();
        assert!(err.to_string().contains("Checksum mismatch"));
    }

    #[test]
    fn test_truncated_batch_rejected() {
        let bytes = sample_batch().serialize().unwrap();
        let err = StoreBatch::deserialize(&bytes[..bytes.len() - 3]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_garbage_length_rejected() {
        let mut bytes = sample_batch().serialize().unwrap();
        bytes[0..4].copy_from_slice(&u32::MAX.to_le_bytes());
        let err = StoreBatch::deserialize(&bytes).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_encoded_len_matches_serialized_frame() {
        let batch = sample_batch();
        assert_eq!(batch.encoded_len(), batch.serialize().unwrap().len());
    }

    #[test]
    fn test_pack_splits_at_limit() {
        let ops: Vec<StoreOp> = (0..10u8)
            .map(|i| StoreOp::Put {
                key: vec![i],
                value: vec![0; 100],
            })
            .collect();
        let per_op = ops[0].encoded_len();
        let limit = MIN_BATCH_SIZE + 3 * per_op;

        let batches = StoreBatch::pack(ops.clone(), limit).unwrap();
        assert_eq!(batches.len(), 4);
        assert!(batches.iter().all(|b| b.encoded_len() <= limit));
        let flattened: Vec<StoreOp> = batches.into_iter().flat_map(|b| b.ops).collect();
        assert_eq!(flattened, ops);
    }

    #[test]
    fn test_pack_rejects_op_larger_than_limit() {
        let op = StoreOp::Put {
            key: b"k".to_vec(),
            value: vec![0; 64],
        };
        let err = StoreBatch::pack(vec![op], 32).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_oversized_batch_is_not_serialized() {
        let batch = StoreBatch::single(StoreOp::Put {
            key: b"big".to_vec(),
            value: vec![0; MAX_BATCH_SIZE],
        });
        let err = batch.serialize().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_empty_batch_is_valid() {
        let bytes = StoreBatch::default().serialize().unwrap();
        assert_eq!(bytes.len(), MIN_BATCH_SIZE);
        let (decoded, _) = StoreBatch::deserialize(&bytes).unwrap();
        assert!(decoded.is_empty());
    }
}

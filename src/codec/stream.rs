//! Byte stream primitives for the wallet record format
//!
//! Fixed-width integers are little-endian. Variable-length fields carry a
//! compact-size prefix:
//!
//! ```text
//! < 0xfd        1 byte
//! 0xfd + u16    3 bytes
//! 0xfe + u32    5 bytes
//! 0xff + u64    9 bytes
//! ```

use super::errors::{DecodeError, DecodeResult};

/// Largest length accepted for any single variable-length field.
pub const MAX_FIELD_SIZE: u64 = 0x0200_0000;

/// Types with a canonical stream encoding.
pub trait Encodable {
    fn encode(&self, w: &mut StreamWriter);

    fn to_bytes(&self) -> Vec<u8> {
        let mut w = StreamWriter::new();
        self.encode(&mut w);
        w.into_bytes()
    }
}

/// Types decodable from the stream encoding.
pub trait Decodable: Sized {
    fn decode(r: &mut StreamReader<'_>) -> DecodeResult<Self>;
}

#[derive(Debug, Default, Clone)]
pub struct StreamWriter {
    buf: Vec<u8>,
}

impl StreamWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.buf.push(v as u8);
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_compact_size(&mut self, n: u64) {
        if n < 0xfd {
            self.buf.push(n as u8);
        } else if n <= 0xffff {
            self.buf.push(0xfd);
            self.buf.extend_from_slice(&(n as u16).to_le_bytes());
        } else if n <= 0xffff_ffff {
            self.buf.push(0xfe);
            self.buf.extend_from_slice(&(n as u32).to_le_bytes());
        } else {
            self.buf.push(0xff);
            self.buf.extend_from_slice(&n.to_le_bytes());
        }
    }

    /// Bytes without a length prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Compact-size prefixed bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_compact_size(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    pub fn write_vec<T: Encodable>(&mut self, items: &[T]) {
        self.write_compact_size(items.len() as u64);
        for item in items {
            item.encode(self);
        }
    }

    pub fn write<T: Encodable>(&mut self, item: &T) {
        item.encode(self);
    }
}

#[derive(Debug, Clone)]
pub struct StreamReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> StreamReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Everything not yet consumed.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn read_raw(&mut self, n: usize) -> DecodeResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(DecodeError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_raw(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.read_raw(1)?[0])
    }

    /// Any non-zero byte is true.
    pub fn read_bool(&mut self) -> DecodeResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u32(&mut self) -> DecodeResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> DecodeResult<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> DecodeResult<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> DecodeResult<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    pub fn read_compact_size(&mut self) -> DecodeResult<u64> {
        let first = self.read_u8()?;
        let n = match first {
            0xfd => {
                let n = u16::from_le_bytes(self.read_array()?) as u64;
                if n < 0xfd {
                    return Err(DecodeError::NonCanonicalSize);
                }
                n
            }
            0xfe => {
                let n = u32::from_le_bytes(self.read_array()?) as u64;
                if n <= 0xffff {
                    return Err(DecodeError::NonCanonicalSize);
                }
                n
            }
            0xff => {
                let n = u64::from_le_bytes(self.read_array()?);
                if n <= 0xffff_ffff {
                    return Err(DecodeError::NonCanonicalSize);
                }
                n
            }
            small => small as u64,
        };
        if n > MAX_FIELD_SIZE {
            return Err(DecodeError::Oversized(n));
        }
        Ok(n)
    }

    pub fn read_bytes(&mut self) -> DecodeResult<Vec<u8>> {
        let len = self.read_compact_size()? as usize;
        Ok(self.read_raw(len)?.to_vec())
    }

    pub fn read_string(&mut self) -> DecodeResult<String> {
        String::from_utf8(self.read_bytes()?).map_err(|_| DecodeError::InvalidUtf8)
    }

    pub fn read_vec<T: Decodable>(&mut self) -> DecodeResult<Vec<T>> {
        let count = self.read_compact_size()? as usize;
        // Each element takes at least one byte; cap the preallocation by
        // what is actually left.
        let mut items = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            items.push(T::decode(self)?);
        }
        Ok(items)
    }

    pub fn read<T: Decodable>(&mut self) -> DecodeResult<T> {
        T::decode(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_size_boundaries() {
        for n in [0u64, 0xfc, 0xfd, 0xffff, 0x10000, 0x01ff_ffff] {
            let mut w = StreamWriter::new();
            w.write_compact_size(n);
            let bytes = w.into_bytes();
            let mut r = StreamReader::new(&bytes);
            assert_eq!(r.read_compact_size().unwrap(), n);
            assert!(r.is_empty());
        }
    }

    #[test]
    fn test_compact_size_widths() {
        let width = |n: u64| {
            let mut w = StreamWriter::new();
            w.write_compact_size(n);
            w.into_bytes().len()
        };
        assert_eq!(width(0xfc), 1);
        assert_eq!(width(0xfd), 3);
        assert_eq!(width(0x10000), 5);
        assert_eq!(width(0x1_0000_0000), 9);
    }

    #[test]
    fn test_non_canonical_size_rejected() {
        let bytes = [0xfd, 0x10, 0x00];
        let mut r = StreamReader::new(&bytes);
        assert_eq!(r.read_compact_size(), Err(DecodeError::NonCanonicalSize));
    }

    #[test]
    fn test_oversized_field_rejected() {
        let mut w = StreamWriter::new();
        w.write_compact_size(MAX_FIELD_SIZE + 1);
        let bytes = w.into_bytes();
        let mut r = StreamReader::new(&bytes);
        assert!(matches!(r.read_compact_size(), Err(DecodeError::Oversized(_))));
    }

    #[test]
    fn test_truncated_string_reports_eof() {
        let mut w = StreamWriter::new();
        w.write_str("hello");
        let bytes = w.into_bytes();
        let mut r = StreamReader::new(&bytes[..4]);
        assert_eq!(
            r.read_string(),
            Err(DecodeError::UnexpectedEof {
                needed: 5,
                remaining: 3
            })
        );
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let bytes = [0x02, 0xff, 0xfe];
        let mut r = StreamReader::new(&bytes);
        assert_eq!(r.read_string(), Err(DecodeError::InvalidUtf8));
    }

    #[test]
    fn test_integers_are_little_endian() {
        let mut w = StreamWriter::new();
        w.write_u32(0x0403_0201);
        w.write_i64(-1);
        let bytes = w.into_bytes();
        assert_eq!(&bytes[..4], &[1, 2, 3, 4]);
        let mut r = StreamReader::new(&bytes);
        assert_eq!(r.read_u32().unwrap(), 0x0403_0201);
        assert_eq!(r.read_i64().unwrap(), -1);
    }
}

//! Forward-only big-endian reader over a borrowed buffer window.

use crate::error::{Result, WireError};

/// Cursor over `buf[offset..offset + size]`. Never copies the window.
///
/// Reads past the end of the window fail with [`WireError::Truncated`];
/// callers tolerating partial frames check [`available`](Self::available)
/// or [`has_data`](Self::has_data) first.
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    buf: &'a [u8],
    end: usize,
    index: usize,
}

impl<'a> BinaryReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            end: buf.len(),
            index: 0,
        }
    }

    /// Reader over a sub-window. The window is clamped to the buffer.
    pub fn with_window(buf: &'a [u8], offset: usize, size: usize) -> Self {
        let start = offset.min(buf.len());
        let end = start.saturating_add(size).min(buf.len());
        Self {
            buf,
            end,
            index: start,
        }
    }

    /// Absolute position in the underlying buffer.
    pub fn position(&self) -> usize {
        self.index
    }

    /// Bytes left in the window.
    pub fn remaining(&self) -> usize {
        self.end - self.index
    }

    pub fn has_data(&self) -> bool {
        self.index < self.end
    }

    /// Whether at least `n` more bytes remain.
    pub fn available(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    /// The whole underlying buffer, for checksums over absolute ranges.
    pub fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn read_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        if !self.available(n) {
            return Err(WireError::Truncated {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.index..self.index + n];
        self.index += n;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_slice(n).map(|_| ())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_array().map(i16::from_be_bytes)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_array().map(i32::from_be_bytes)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_array().map(i64::from_be_bytes)
    }

    /// int16-prefixed UTF-8 string. -1 is `None`; other non-positive
    /// lengths give an empty string. Invalid UTF-8 is a protocol error.
    pub fn read_string(&mut self) -> Result<Option<String>> {
        let size = self.read_i16()?;
        if size == -1 {
            return Ok(None);
        }
        if size <= 0 {
            return Ok(Some(String::new()));
        }
        let start = self.index;
        let bytes = self.read_slice(size as usize)?;
        let s = std::str::from_utf8(bytes).map_err(|e| {
            WireError::Protocol(format!("invalid UTF-8 in string at byte {}: {}", start, e))
        })?;
        Ok(Some(s.to_string()))
    }

    /// int32-prefixed byte array. -1 is `None`; other non-positive
    /// lengths give an empty array.
    pub fn read_bytes(&mut self) -> Result<Option<Vec<u8>>> {
        let size = self.read_i32()?;
        if size == -1 {
            return Ok(None);
        }
        if size <= 0 {
            return Ok(Some(Vec::new()));
        }
        Ok(Some(self.read_slice(size as usize)?.to_vec()))
    }

    /// int32 element count. Negative counts read as zero.
    pub fn read_count(&mut self) -> Result<usize> {
        Ok(self.read_i32()?.max(0) as usize)
    }

    /// Count-prefixed array of int32 values.
    pub fn read_i32_array(&mut self) -> Result<Vec<i32>> {
        let count = self.read_count()?;
        let mut out = Vec::with_capacity(count.min(self.remaining() / 4));
        for _ in 0..count {
            out.push(self.read_i32()?);
        }
        Ok(out)
    }
}

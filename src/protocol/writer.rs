//! Append-only big-endian writer with length/CRC placeholders.

use super::constants::ApiKey;
use super::crc32;
use crate::error::{Result, WireError};
use bytes::{BufMut, BytesMut};

const PLACEHOLDER_LEN: usize = 4;

/// Growable frame buffer.
///
/// Frames describe their own length, and messages their own CRC, without a
/// pre-pass: reserve 4 bytes with [`put_placeholder`](Self::put_placeholder),
/// write the payload, then patch the reserved bytes with
/// [`write_length_at`](Self::write_length_at) or
/// [`write_crc_at`](Self::write_crc_at).
#[derive(Debug, Default, Clone)]
pub struct BinaryWriter {
    buf: BytesMut,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Current write position (always the end of the buffer).
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> BytesMut {
        self.buf
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn put_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    pub fn put_i16(&mut self, value: i16) {
        self.buf.put_i16(value);
    }

    pub fn put_i32(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    pub fn put_i64(&mut self, value: i64) {
        self.buf.put_i64(value);
    }

    pub fn put_api_key(&mut self, key: ApiKey) {
        self.put_i16(key.code());
    }

    /// int16 length + UTF-8 bytes. `None` and `""` both go out as length -1.
    /// Strings over `i16::MAX` bytes are rejected and nothing is written.
    pub fn put_string(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            Some(s) if !s.is_empty() => {
                let len = i16::try_from(s.len()).map_err(|_| {
                    WireError::Protocol(format!(
                        "string of {} bytes exceeds the int16 length prefix",
                        s.len()
                    ))
                })?;
                self.buf.put_i16(len);
                self.buf.extend_from_slice(s.as_bytes());
            }
            _ => self.buf.put_i16(-1),
        }
        Ok(())
    }

    /// int32 length + raw bytes; `None` is length -1.
    /// Arrays over `i32::MAX` bytes are rejected and nothing is written.
    pub fn put_bytes(&mut self, value: Option<&[u8]>) -> Result<()> {
        match value {
            Some(b) => {
                let len = i32::try_from(b.len()).map_err(|_| {
                    WireError::Protocol(format!(
                        "byte array of {} bytes exceeds the int32 length prefix",
                        b.len()
                    ))
                })?;
                self.buf.put_i32(len);
                self.buf.extend_from_slice(b);
            }
            None => self.buf.put_i32(-1),
        }
        Ok(())
    }

    /// Count-prefixed array of int32 values.
    pub fn put_i32_array(&mut self, values: &[i32]) {
        self.buf.put_i32(values.len() as i32);
        for v in values {
            self.buf.put_i32(*v);
        }
    }

    /// Reserve 4 zero bytes; returns the position of the reservation.
    pub fn put_placeholder(&mut self) -> usize {
        let position = self.buf.len();
        self.buf.put_u32(0);
        position
    }

    /// Patch the placeholder at `position` with the number of bytes written after it.
    pub fn write_length_at(&mut self, position: usize) {
        let length = (self.buf.len() - position - PLACEHOLDER_LEN) as i32;
        self.buf[position..position + PLACEHOLDER_LEN].copy_from_slice(&length.to_be_bytes());
    }

    /// Patch the placeholder at `position` with the CRC of everything written after it.
    pub fn write_crc_at(&mut self, position: usize) {
        let start = position + PLACEHOLDER_LEN;
        let crc = crc32::compute(&self.buf[start..]);
        self.buf[position..start].copy_from_slice(&crc.to_be_bytes());
    }
}

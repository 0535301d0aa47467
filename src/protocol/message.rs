//! Message-set framing: offset, size, CRC, attributes, key, value.

use super::constants::MessageCodec;
use super::crc32;
use super::reader::BinaryReader;
use super::writer::BinaryWriter;
use crate::error::{Result, WireError};
use crate::types::Message;

/// 8-byte offset + 4-byte size.
pub const MINIMUM_MESSAGE_SIZE: usize = 12;

const CRC_LEN: usize = 4;

/// Append `messages` back to back. Offsets go out as zero; the broker assigns them.
pub fn encode_messages<'m>(
    writer: &mut BinaryWriter,
    messages: impl IntoIterator<Item = &'m Message>,
) -> Result<()> {
    for message in messages {
        writer.put_i64(0);
        let size = writer.put_placeholder();
        let crc = writer.put_placeholder();
        writer.put_u8(message.magic);
        writer.put_u8(message.attributes);
        writer.put_bytes(message.key.as_deref())?;
        writer.put_bytes(message.value.as_deref())?;
        writer.write_crc_at(crc);
        writer.write_length_at(size);
    }
    Ok(())
}

/// Decode a message set.
///
/// A trailing message cut short (the broker stops at the fetch's byte cap)
/// ends the set without error. A checksum mismatch or a compressed message
/// fails the whole call.
pub fn decode_messages(set: &[u8], partition_id: i32) -> Result<Vec<Message>> {
    let mut reader = BinaryReader::new(set);
    let mut messages = Vec::new();
    while reader.has_data() {
        if !reader.available(MINIMUM_MESSAGE_SIZE) {
            break;
        }
        let offset = reader.read_i64()?;
        let size = reader.read_i32()?;
        if size < 0 || !reader.available(size as usize) {
            break;
        }
        let body = reader.read_slice(size as usize)?;
        messages.push(decode_message(body, offset, partition_id)?);
    }
    Ok(messages)
}

fn decode_message(body: &[u8], offset: i64, partition_id: i32) -> Result<Message> {
    if body.len() < CRC_LEN {
        return Err(WireError::Protocol(format!(
            "message at offset {} is {} bytes, too short for its checksum",
            offset,
            body.len()
        )));
    }
    let (stored, covered) = body.split_at(CRC_LEN);
    if crc32::compute(covered).to_be_bytes() != stored {
        return Err(WireError::CrcMismatch { offset });
    }

    let mut reader = BinaryReader::new(covered);
    let magic = reader.read_u8()?;
    let attributes = reader.read_u8()?;
    let key = reader.read_bytes()?;
    match MessageCodec::from_attributes(attributes) {
        Ok(MessageCodec::None) => {}
        Ok(codec) => return Err(WireError::UnsupportedCodec(codec.id())),
        Err(id) => return Err(WireError::UnsupportedCodec(id)),
    }
    let value = reader.read_bytes()?;

    Ok(Message {
        offset,
        partition_id,
        magic,
        attributes,
        key,
        value,
    })
}

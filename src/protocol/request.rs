//! Shared request shape: header, framing and topic grouping.

use super::constants::{ApiKey, API_VERSION, DEFAULT_CLIENT_ID};
use super::reader::BinaryReader;
use super::writer::BinaryWriter;
use crate::error::Result;
use bytes::BytesMut;

/// Fields common to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeader {
    /// Echoed verbatim by the broker; lets the caller pair responses.
    pub correlation_id: i32,
    /// Descriptive name of the client.
    pub client_id: Option<String>,
}

impl Default for RequestHeader {
    fn default() -> Self {
        Self {
            correlation_id: 1,
            client_id: Some(DEFAULT_CLIENT_ID.to_string()),
        }
    }
}

impl RequestHeader {
    pub fn new(correlation_id: i32, client_id: impl Into<String>) -> Self {
        Self {
            correlation_id,
            client_id: Some(client_id.into()),
        }
    }
}

/// A typed request paired with its response decoder.
pub trait KafkaRequest {
    type Response;

    fn api_key(&self) -> ApiKey;

    fn header(&self) -> &RequestHeader;

    /// Write the complete, length-prefixed request frame.
    fn encode(&self, writer: &mut BinaryWriter) -> Result<()>;

    /// Decode a response frame body (everything after the 4-byte length).
    fn decode(&self, data: &[u8]) -> Result<Vec<Self::Response>>;
}

/// Encode `request` into a fresh buffer ready for the socket.
pub fn frame<R: KafkaRequest>(request: &R) -> Result<BytesMut> {
    let mut writer = BinaryWriter::with_capacity(256);
    request.encode(&mut writer)?;
    Ok(writer.into_inner())
}

/// Correlation id echoed at the start of a response frame body.
pub fn correlation_id_of(data: &[u8]) -> Result<i32> {
    BinaryReader::new(data).read_i32()
}

/// Length placeholder, header, body, then the length patch.
pub(crate) fn encode_frame<F>(
    writer: &mut BinaryWriter,
    api_key: ApiKey,
    header: &RequestHeader,
    body: F,
) -> Result<()>
where
    F: FnOnce(&mut BinaryWriter) -> Result<()>,
{
    let length = writer.put_placeholder();
    writer.put_api_key(api_key);
    writer.put_i16(API_VERSION);
    writer.put_i32(header.correlation_id);
    writer.put_string(header.client_id.as_deref())?;
    body(writer)?;
    writer.write_length_at(length);
    Ok(())
}

/// Group entries by topic in first-appearance order; within a topic,
/// entries of the same partition are kept adjacent.
pub(crate) fn group_by_topic<'a, T>(
    entries: &'a [T],
    topic: impl Fn(&T) -> &str,
    partition: impl Fn(&T) -> i32,
) -> Vec<(&'a str, Vec<&'a T>)> {
    let mut groups: Vec<(&'a str, Vec<&'a T>)> = Vec::new();
    for entry in entries {
        let name: &'a str = topic(entry);
        match groups.iter_mut().find(|(t, _)| *t == name) {
            Some((_, members)) => members.push(entry),
            None => groups.push((name, vec![entry])),
        }
    }
    for (_, members) in &mut groups {
        let mut order: Vec<i32> = Vec::new();
        for m in members.iter() {
            let p = partition(*m);
            if !order.contains(&p) {
                order.push(p);
            }
        }
        members.sort_by_key(|m| order.iter().position(|p| *p == partition(*m)));
    }
    groups
}

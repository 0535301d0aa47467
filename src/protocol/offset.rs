//! Offset (api key 2): ask for the offsets available in a partition.

use super::constants::{ApiKey, ErrorCode, CLIENT_REPLICA_ID};
use super::reader::BinaryReader;
use super::request::{encode_frame, group_by_topic, KafkaRequest, RequestHeader};
use super::writer::BinaryWriter;
use crate::error::Result;
use serde::Serialize;

/// `time` value asking for the next offset to be written.
pub const LATEST_TIME: i64 = -1;
/// `time` value asking for the oldest retained offset.
pub const EARLIEST_TIME: i64 = -2;

#[derive(Debug, Clone, Default)]
pub struct OffsetRequest {
    pub header: RequestHeader,
    pub offsets: Vec<Offset>,
}

impl OffsetRequest {
    pub fn new(header: RequestHeader, offsets: Vec<Offset>) -> Self {
        Self { header, offsets }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offset {
    pub topic: String,
    pub partition_id: i32,
    /// Offsets before this time (ms), or [`LATEST_TIME`] / [`EARLIEST_TIME`].
    pub time: i64,
    pub max_offsets: i32,
}

impl Offset {
    pub fn latest(topic: impl Into<String>, partition_id: i32) -> Self {
        Self {
            topic: topic.into(),
            partition_id,
            time: LATEST_TIME,
            max_offsets: 1,
        }
    }

    pub fn earliest(topic: impl Into<String>, partition_id: i32) -> Self {
        Self {
            time: EARLIEST_TIME,
            ..Self::latest(topic, partition_id)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OffsetResponse {
    pub topic: String,
    pub partition_id: i32,
    pub error: ErrorCode,
    /// Segment start offsets, newest first.
    pub offsets: Vec<i64>,
}

impl KafkaRequest for OffsetRequest {
    type Response = OffsetResponse;

    fn api_key(&self) -> ApiKey {
        ApiKey::Offset
    }

    fn header(&self) -> &RequestHeader {
        &self.header
    }

    fn encode(&self, writer: &mut BinaryWriter) -> Result<()> {
        let topics = group_by_topic(&self.offsets, |o| o.topic.as_str(), |o| o.partition_id);
        encode_frame(writer, ApiKey::Offset, &self.header, |w| {
            w.put_i32(CLIENT_REPLICA_ID);
            w.put_i32(topics.len() as i32);
            for (topic, offsets) in &topics {
                w.put_string(Some(*topic))?;
                w.put_i32(offsets.len() as i32);
                for offset in offsets {
                    w.put_i32(offset.partition_id);
                    w.put_i64(offset.time);
                    w.put_i32(offset.max_offsets);
                }
            }
            Ok(())
        })
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<OffsetResponse>> {
        let mut reader = BinaryReader::new(data);
        let _correlation_id = reader.read_i32()?;

        let mut responses = Vec::new();
        let topic_count = reader.read_count()?;
        for _ in 0..topic_count {
            let topic = reader.read_string()?.unwrap_or_default();
            let partition_count = reader.read_count()?;
            for _ in 0..partition_count {
                let partition_id = reader.read_i32()?;
                let error = ErrorCode::from(reader.read_i16()?);
                let count = reader.read_count()?;
                let mut offsets = Vec::with_capacity(count.min(reader.remaining() / 8));
                for _ in 0..count {
                    offsets.push(reader.read_i64()?);
                }
                responses.push(OffsetResponse {
                    topic: topic.clone(),
                    partition_id,
                    error,
                    offsets,
                });
            }
        }
        Ok(responses)
    }
}

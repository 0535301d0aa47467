//! Fetch (api key 1): read message sets from topic partitions.

use super::constants::{ApiKey, ErrorCode, CLIENT_REPLICA_ID};
use super::message::decode_messages;
use super::reader::BinaryReader;
use super::request::{encode_frame, group_by_topic, KafkaRequest, RequestHeader};
use super::writer::BinaryWriter;
use crate::error::Result;
use crate::types::Message;
use serde::Serialize;

pub const DEFAULT_MIN_BYTES: i32 = 4096;
pub const DEFAULT_MAX_WAIT_TIME: i32 = 10;
pub const DEFAULT_MAX_BYTES: i32 = DEFAULT_MIN_BYTES * 8;

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub header: RequestHeader,
    /// Max time (ms) the broker blocks waiting for `min_bytes`.
    pub max_wait_time: i32,
    /// Bytes that must be available before the broker answers; 0 never blocks.
    pub min_bytes: i32,
    pub fetches: Vec<Fetch>,
}

impl Default for FetchRequest {
    fn default() -> Self {
        Self {
            header: RequestHeader::default(),
            max_wait_time: DEFAULT_MAX_WAIT_TIME,
            min_bytes: DEFAULT_MIN_BYTES,
            fetches: Vec::new(),
        }
    }
}

impl FetchRequest {
    pub fn new(header: RequestHeader, fetches: Vec<Fetch>) -> Self {
        Self {
            header,
            fetches,
            ..Self::default()
        }
    }
}

/// One partition to fetch from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetch {
    pub topic: String,
    pub partition_id: i32,
    /// First offset to return.
    pub offset: i64,
    /// Upper bound on the message-set bytes returned for this partition.
    pub max_bytes: i32,
}

impl Fetch {
    pub fn new(topic: impl Into<String>, partition_id: i32, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition_id,
            offset,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchResponse {
    pub topic: String,
    pub partition_id: i32,
    pub error: ErrorCode,
    /// Offset at the end of the partition log.
    pub high_water_mark: i64,
    pub messages: Vec<Message>,
}

impl KafkaRequest for FetchRequest {
    type Response = FetchResponse;

    fn api_key(&self) -> ApiKey {
        ApiKey::Fetch
    }

    fn header(&self) -> &RequestHeader {
        &self.header
    }

    fn encode(&self, writer: &mut BinaryWriter) -> Result<()> {
        let topics = group_by_topic(&self.fetches, |f| f.topic.as_str(), |f| f.partition_id);
        encode_frame(writer, ApiKey::Fetch, &self.header, |w| {
            w.put_i32(CLIENT_REPLICA_ID);
            w.put_i32(self.max_wait_time);
            w.put_i32(self.min_bytes);
            w.put_i32(topics.len() as i32);
            for (topic, fetches) in &topics {
                w.put_string(Some(*topic))?;
                w.put_i32(fetches.len() as i32);
                for fetch in fetches {
                    w.put_i32(fetch.partition_id);
                    w.put_i64(fetch.offset);
                    w.put_i32(fetch.max_bytes);
                }
            }
            Ok(())
        })
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<FetchResponse>> {
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
                let high_water_mark = reader.read_i64()?;
                let set_size = reader.read_count()?;
                let set = reader.read_slice(set_size)?;
                responses.push(FetchResponse {
                    topic: topic.clone(),
                    partition_id,
                    error,
                    high_water_mark,
                    messages: decode_messages(set, partition_id)?,
                });
            }
        }
        Ok(responses)
    }
}

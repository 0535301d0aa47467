//! OffsetFetch (api key 9): load positions previously committed by a group.

use super::constants::{ApiKey, ErrorCode};
use super::reader::BinaryReader;
use super::request::{encode_frame, group_by_topic, KafkaRequest, RequestHeader};
use super::writer::BinaryWriter;
use crate::error::Result;
use crate::types::OffsetPosition;
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct OffsetFetchRequest {
    pub header: RequestHeader,
    pub consumer_group: String,
    pub topics: Vec<OffsetFetch>,
}

impl OffsetFetchRequest {
    pub fn new(
        header: RequestHeader,
        consumer_group: impl Into<String>,
        topics: Vec<OffsetFetch>,
    ) -> Self {
        Self {
            header,
            consumer_group: consumer_group.into(),
            topics,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetFetch {
    pub topic: String,
    pub partition_id: i32,
}

impl OffsetFetch {
    pub fn new(topic: impl Into<String>, partition_id: i32) -> Self {
        Self {
            topic: topic.into(),
            partition_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OffsetFetchResponse {
    pub topic: String,
    pub partition_id: i32,
    /// Committed offset; -1 when the group never committed this partition.
    pub offset: i64,
    pub metadata: Option<String>,
    pub error: ErrorCode,
}

impl OffsetFetchResponse {
    pub fn position(&self) -> OffsetPosition {
        OffsetPosition::new(self.partition_id, self.offset)
    }
}

impl KafkaRequest for OffsetFetchRequest {
    type Response = OffsetFetchResponse;

    fn api_key(&self) -> ApiKey {
        ApiKey::OffsetFetch
    }

    fn header(&self) -> &RequestHeader {
        &self.header
    }

    fn encode(&self, writer: &mut BinaryWriter) -> Result<()> {
        let topics = group_by_topic(&self.topics, |t| t.topic.as_str(), |t| t.partition_id);
        encode_frame(writer, ApiKey::OffsetFetch, &self.header, |w| {
            w.put_string(Some(&self.consumer_group))?;
            w.put_i32(topics.len() as i32);
            for (topic, partitions) in &topics {
                w.put_string(Some(*topic))?;
                w.put_i32(partitions.len() as i32);
                for p in partitions {
                    w.put_i32(p.partition_id);
                }
            }
            Ok(())
        })
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<OffsetFetchResponse>> {
        let mut reader = BinaryReader::new(data);
        let _correlation_id = reader.read_i32()?;

        let mut responses = Vec::new();
        let topic_count = reader.read_count()?;
        for _ in 0..topic_count {
            let topic = reader.read_string()?.unwrap_or_default();
            let partition_count = reader.read_count()?;
            for _ in 0..partition_count {
                responses.push(OffsetFetchResponse {
                    topic: topic.clone(),
                    partition_id: reader.read_i32()?,
                    offset: reader.read_i64()?,
                    metadata: reader.read_string()?,
                    error: ErrorCode::from(reader.read_i16()?),
                });
            }
        }
        Ok(responses)
    }
}

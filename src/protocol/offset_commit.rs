//! OffsetCommit (api key 8): store consumer positions under a group name.

use super::constants::{ApiKey, ErrorCode};
use super::reader::BinaryReader;
use super::request::{encode_frame, group_by_topic, KafkaRequest, RequestHeader};
use super::writer::BinaryWriter;
use crate::error::Result;
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct OffsetCommitRequest {
    pub header: RequestHeader,
    pub consumer_group: String,
    pub commits: Vec<OffsetCommit>,
}

impl OffsetCommitRequest {
    pub fn new(
        header: RequestHeader,
        consumer_group: impl Into<String>,
        commits: Vec<OffsetCommit>,
    ) -> Self {
        Self {
            header,
            consumer_group: consumer_group.into(),
            commits,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetCommit {
    pub topic: String,
    pub partition_id: i32,
    pub offset: i64,
    /// -1 lets the broker stamp the commit with its receive time.
    pub timestamp: i64,
    pub metadata: Option<String>,
}

impl OffsetCommit {
    pub fn new(topic: impl Into<String>, partition_id: i32, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition_id,
            offset,
            timestamp: -1,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OffsetCommitResponse {
    pub topic: String,
    pub partition_id: i32,
    pub error: ErrorCode,
}

impl KafkaRequest for OffsetCommitRequest {
    type Response = OffsetCommitResponse;

    fn api_key(&self) -> ApiKey {
        ApiKey::OffsetCommit
    }

    fn header(&self) -> &RequestHeader {
        &self.header
    }

    fn encode(&self, writer: &mut BinaryWriter) -> Result<()> {
        let topics = group_by_topic(&self.commits, |c| c.topic.as_str(), |c| c.partition_id);
        encode_frame(writer, ApiKey::OffsetCommit, &self.header, |w| {
            w.put_string(Some(&self.consumer_group))?;
            w.put_i32(topics.len() as i32);
            for (topic, commits) in &topics {
                w.put_string(Some(*topic))?;
                w.put_i32(commits.len() as i32);
                for commit in commits {
                    w.put_i32(commit.partition_id);
                    w.put_i64(commit.offset);
                    w.put_i64(commit.timestamp);
                    w.put_string(commit.metadata.as_deref())?;
                }
            }
            Ok(())
        })
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<OffsetCommitResponse>> {
        let mut reader = BinaryReader::new(data);
        let _correlation_id = reader.read_i32()?;

        let mut responses = Vec::new();
        let topic_count = reader.read_count()?;
        for _ in 0..topic_count {
            let topic = reader.read_string()?.unwrap_or_default();
            let partition_count = reader.read_count()?;
            for _ in 0..partition_count {
                responses.push(OffsetCommitResponse {
                    topic: topic.clone(),
                    partition_id: reader.read_i32()?,
                    error: ErrorCode::from(reader.read_i16()?),
                });
            }
        }
        Ok(responses)
    }
}

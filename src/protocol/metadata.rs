//! Metadata (api key 3): brokers and partition leadership for topics.

use super::constants::{ApiKey, ErrorCode};
use super::reader::BinaryReader;
use super::request::{encode_frame, KafkaRequest, RequestHeader};
use super::writer::BinaryWriter;
use crate::error::Result;
use crate::types::Broker;
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct MetadataRequest {
    pub header: RequestHeader,
    /// Topics to describe; empty asks for every topic.
    pub topics: Vec<String>,
}

impl MetadataRequest {
    pub fn new(header: RequestHeader, topics: Vec<String>) -> Self {
        Self { header, topics }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetadataResponse {
    pub correlation_id: i32,
    pub brokers: Vec<Broker>,
    pub topics: Vec<Topic>,
}

impl MetadataResponse {
    pub fn broker(&self, broker_id: i32) -> Option<&Broker> {
        self.brokers.iter().find(|b| b.broker_id == broker_id)
    }

    /// Leader broker of `topic`/`partition_id`, if the partition has one.
    pub fn leader_for(&self, topic: &str, partition_id: i32) -> Option<&Broker> {
        let partition = self
            .topics
            .iter()
            .find(|t| t.name == topic)?
            .partitions
            .iter()
            .find(|p| p.partition_id == partition_id)?;
        if !partition.error.is_ok() || partition.leader_id < 0 {
            return None;
        }
        self.broker(partition.leader_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topic {
    pub error: ErrorCode,
    pub name: String,
    pub partitions: Vec<PartitionMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionMetadata {
    pub error: ErrorCode,
    pub partition_id: i32,
    /// -1 while the partition has no leader.
    pub leader_id: i32,
    pub replicas: Vec<i32>,
    pub isrs: Vec<i32>,
}

fn read_broker(reader: &mut BinaryReader<'_>) -> Result<Broker> {
    Ok(Broker {
        broker_id: reader.read_i32()?,
        host: reader.read_string()?.unwrap_or_default(),
        port: reader.read_i32()?,
    })
}

fn read_topic(reader: &mut BinaryReader<'_>) -> Result<Topic> {
    let error = ErrorCode::from(reader.read_i16()?);
    let name = reader.read_string()?.unwrap_or_default();
    let count = reader.read_count()?;
    let mut partitions = Vec::with_capacity(count.min(reader.remaining()));
    for _ in 0..count {
        partitions.push(PartitionMetadata {
            error: ErrorCode::from(reader.read_i16()?),
            partition_id: reader.read_i32()?,
            leader_id: reader.read_i32()?,
            replicas: reader.read_i32_array()?,
            isrs: reader.read_i32_array()?,
        });
    }
    Ok(Topic {
        error,
        name,
        partitions,
    })
}

impl KafkaRequest for MetadataRequest {
    type Response = MetadataResponse;

    fn api_key(&self) -> ApiKey {
        ApiKey::Metadata
    }

    fn header(&self) -> &RequestHeader {
        &self.header
    }

    fn encode(&self, writer: &mut BinaryWriter) -> Result<()> {
        encode_frame(writer, ApiKey::Metadata, &self.header, |w| {
            w.put_i32(self.topics.len() as i32);
            for topic in &self.topics {
                w.put_string(Some(topic))?;
            }
            Ok(())
        })
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<MetadataResponse>> {
        let mut reader = BinaryReader::new(data);
        let mut response = MetadataResponse {
            correlation_id: reader.read_i32()?,
            ..MetadataResponse::default()
        };

        let broker_count = reader.read_count()?;
        for _ in 0..broker_count {
            response.brokers.push(read_broker(&mut reader)?);
        }
        let topic_count = reader.read_count()?;
        for _ in 0..topic_count {
            response.topics.push(read_topic(&mut reader)?);
        }
        Ok(vec![response])
    }
}

//! ConsumerMetadata (api key 10): locate the offset coordinator of a group.

use super::constants::{ApiKey, ErrorCode};
use super::reader::BinaryReader;
use super::request::{encode_frame, KafkaRequest, RequestHeader};
use super::writer::BinaryWriter;
use crate::error::Result;
use crate::types::Broker;
use serde::Serialize;

/// Offset commits and fetches for a group must go to its coordinator broker.
#[derive(Debug, Clone, Default)]
pub struct ConsumerMetadataRequest {
    pub header: RequestHeader,
    pub consumer_group: String,
}

impl ConsumerMetadataRequest {
    pub fn new(header: RequestHeader, consumer_group: impl Into<String>) -> Self {
        Self {
            header,
            consumer_group: consumer_group.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsumerMetadataResponse {
    pub error: ErrorCode,
    pub coordinator_id: i32,
    pub coordinator_host: String,
    pub coordinator_port: i32,
}

impl ConsumerMetadataResponse {
    pub fn coordinator(&self) -> Broker {
        Broker {
            broker_id: self.coordinator_id,
            host: self.coordinator_host.clone(),
            port: self.coordinator_port,
        }
    }
}

impl KafkaRequest for ConsumerMetadataRequest {
    type Response = ConsumerMetadataResponse;

    fn api_key(&self) -> ApiKey {
        ApiKey::ConsumerMetadata
    }

    fn header(&self) -> &RequestHeader {
        &self.header
    }

    fn encode(&self, writer: &mut BinaryWriter) -> Result<()> {
        encode_frame(writer, ApiKey::ConsumerMetadata, &self.header, |w| {
            w.put_string(Some(&self.consumer_group))
        })
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<ConsumerMetadataResponse>> {
        let mut reader = BinaryReader::new(data);
        let _correlation_id = reader.read_i32()?;
        Ok(vec![ConsumerMetadataResponse {
            error: ErrorCode::from(reader.read_i16()?),
            coordinator_id: reader.read_i32()?,
            coordinator_host: reader.read_string()?.unwrap_or_default(),
            coordinator_port: reader.read_i32()?,
        }])
    }
}

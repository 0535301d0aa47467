//! Produce (api key 0): append message sets to topic partitions.

use super::constants::{ApiKey, ErrorCode, MessageCodec};
use super::message::encode_messages;
use super::reader::BinaryReader;
use super::request::{encode_frame, group_by_topic, KafkaRequest, RequestHeader};
use super::writer::BinaryWriter;
use crate::error::{Result, WireError};
use crate::types::Payload;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct ProduceRequest {
    pub header: RequestHeader,
    /// 0 = no response, 1 = leader written, -1 = all in-sync replicas.
    pub acks: i16,
    /// Time the broker may wait for `acks` before answering.
    pub timeout_ms: i32,
    pub payloads: Vec<Payload>,
}

impl Default for ProduceRequest {
    fn default() -> Self {
        Self {
            header: RequestHeader::default(),
            acks: 1,
            timeout_ms: 1000,
            payloads: Vec::new(),
        }
    }
}

impl ProduceRequest {
    pub fn new(header: RequestHeader, payloads: Vec<Payload>) -> Self {
        Self {
            header,
            payloads,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProduceResponse {
    pub topic: String,
    pub partition_id: i32,
    pub error: ErrorCode,
    /// Offset assigned to the first message of the set.
    pub offset: i64,
}

impl KafkaRequest for ProduceRequest {
    type Response = ProduceResponse;

    fn api_key(&self) -> ApiKey {
        ApiKey::Produce
    }

    fn header(&self) -> &RequestHeader {
        &self.header
    }

    fn encode(&self, writer: &mut BinaryWriter) -> Result<()> {
        if let Some(p) = self.payloads.iter().find(|p| p.codec != MessageCodec::None) {
            return Err(WireError::UnsupportedCodec(p.codec.id()));
        }
        let topics = group_by_topic(&self.payloads, |p| p.topic.as_str(), |p| p.partition);

        encode_frame(writer, ApiKey::Produce, &self.header, |w| {
            w.put_i16(self.acks);
            w.put_i32(self.timeout_ms);
            w.put_i32(topics.len() as i32);
            for (topic, payloads) in &topics {
                let mut partitions: Vec<(i32, Vec<&Payload>)> = Vec::new();
                for p in payloads.iter().copied() {
                    let continues = partitions.last().is_some_and(|(id, _)| *id == p.partition);
                    if continues {
                        if let Some((_, group)) = partitions.last_mut() {
                            group.push(p);
                        }
                    } else {
                        partitions.push((p.partition, vec![p]));
                    }
                }

                w.put_string(Some(*topic))?;
                w.put_i32(partitions.len() as i32);
                for (partition, group) in &partitions {
                    w.put_i32(*partition);
                    let set = w.put_placeholder();
                    encode_messages(w, group.iter().flat_map(|p| p.messages.iter()))?;
                    w.write_length_at(set);
                }
            }
            Ok(())
        })
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<ProduceResponse>> {
        let mut reader = BinaryReader::new(data);
        let _correlation_id = reader.read_i32()?;

        let mut responses = Vec::new();
        let topic_count = reader.read_count()?;
        for _ in 0..topic_count {
            let topic = reader.read_string()?.unwrap_or_default();
            let partition_count = reader.read_count()?;
            for _ in 0..partition_count {
                responses.push(ProduceResponse {
                    topic: topic.clone(),
                    partition_id: reader.read_i32()?,
                    error: ErrorCode::from(reader.read_i16()?),
                    offset: reader.read_i64()?,
                });
            }
        }
        Ok(responses)
    }
}

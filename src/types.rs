//! Core records shared by the codecs and the transport.

use crate::error::Result;
use crate::protocol::MessageCodec;
use crate::transport::Endpoint;
use serde::Serialize;
use std::fmt;

/// A single message as framed inside a message set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Log offset assigned by the broker. Ignored on encode.
    pub offset: i64,
    /// Partition the message was fetched from. Not part of the wire record.
    pub partition_id: i32,
    /// Message format version.
    pub magic: u8,
    /// Attribute bits; the low two bits carry the compression codec.
    pub attributes: u8,
    /// Optional routing key.
    pub key: Option<Vec<u8>>,
    /// Message body.
    pub value: Option<Vec<u8>>,
}

impl Message {
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Codec declared by the attribute bits.
    pub fn codec(&self) -> std::result::Result<MessageCodec, u8> {
        MessageCodec::from_attributes(self.attributes)
    }
}

/// Messages destined for one topic partition, as handed to a Produce request.
#[derive(Debug, Clone)]
pub struct Payload {
    pub topic: String,
    pub partition: i32,
    pub codec: MessageCodec,
    pub messages: Vec<Message>,
}

impl Payload {
    pub fn new(topic: impl Into<String>, partition: i32, messages: Vec<Message>) -> Self {
        Self {
            topic: topic.into(),
            partition,
            codec: MessageCodec::None,
            messages,
        }
    }
}

/// Broker as advertised in a Metadata response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Broker {
    pub broker_id: i32,
    pub host: String,
    pub port: i32,
}

impl Broker {
    /// Network address in `host:port` form.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolve the advertised host into a connectable endpoint.
    pub async fn endpoint(&self) -> Result<Endpoint> {
        let port = u16::try_from(self.port).map_err(|_| {
            crate::error::WireError::Protocol(format!(
                "broker {} advertises invalid port {}",
                self.broker_id, self.port
            ))
        })?;
        Endpoint::resolve(&self.host, port).await
    }
}

/// Consumer read position within one partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct OffsetPosition {
    pub partition_id: i32,
    pub offset: i64,
}

impl OffsetPosition {
    pub fn new(partition_id: i32, offset: i64) -> Self {
        Self {
            partition_id,
            offset,
        }
    }
}

impl fmt::Display for OffsetPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PartitionId:{}, Offset:{}", self.partition_id, self.offset)
    }
}

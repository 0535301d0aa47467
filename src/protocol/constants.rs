//! Protocol-level enums and constants.

use serde::Serialize;

/// Every request carries API version 0.
pub const API_VERSION: i16 = 0;

/// Replica id sent by ordinary clients (non-broker).
pub const CLIENT_REPLICA_ID: i32 = -1;

/// Attribute bits holding the compression codec.
pub const ATTRIBUTE_CODEC_MASK: u8 = 0x03;

/// Client id used when the caller does not set one.
pub const DEFAULT_CLIENT_ID: &str = "thorwire";

/// Request kinds understood by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(i16)]
pub enum ApiKey {
    Produce = 0,
    Fetch = 1,
    Offset = 2,
    Metadata = 3,
    LeaderAndIsr = 4,
    StopReplica = 5,
    OffsetCommit = 8,
    OffsetFetch = 9,
    ConsumerMetadata = 10,
}

impl ApiKey {
    pub fn code(self) -> i16 {
        self as i16
    }
}

/// Compression codec declared in a message's attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum MessageCodec {
    #[default]
    None = 0x00,
    Gzip = 0x01,
    Snappy = 0x02,
}

impl MessageCodec {
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Extract the codec from attribute bits. Unknown ids come back as `Err`.
    pub fn from_attributes(attributes: u8) -> Result<Self, u8> {
        match attributes & ATTRIBUTE_CODEC_MASK {
            0x00 => Ok(MessageCodec::None),
            0x01 => Ok(MessageCodec::Gzip),
            0x02 => Ok(MessageCodec::Snappy),
            other => Err(other),
        }
    }
}

/// Per-partition error code returned by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    NoError,
    Unknown,
    OffsetOutOfRange,
    InvalidMessage,
    UnknownTopicOrPartition,
    InvalidMessageSize,
    LeaderNotAvailable,
    NotLeaderForPartition,
    RequestTimedOut,
    BrokerNotAvailable,
    ReplicaNotAvailable,
    MessageSizeTooLarge,
    StaleControllerEpoch,
    OffsetMetadataTooLarge,
    OffsetsLoadInProgress,
    ConsumerCoordinatorNotAvailable,
    NotCoordinatorForConsumer,
    Unrecognized(i16),
}

impl ErrorCode {
    pub fn code(self) -> i16 {
        match self {
            ErrorCode::NoError => 0,
            ErrorCode::Unknown => -1,
            ErrorCode::OffsetOutOfRange => 1,
            ErrorCode::InvalidMessage => 2,
            ErrorCode::UnknownTopicOrPartition => 3,
            ErrorCode::InvalidMessageSize => 4,
            ErrorCode::LeaderNotAvailable => 5,
            ErrorCode::NotLeaderForPartition => 6,
            ErrorCode::RequestTimedOut => 7,
            ErrorCode::BrokerNotAvailable => 8,
            ErrorCode::ReplicaNotAvailable => 9,
            ErrorCode::MessageSizeTooLarge => 10,
            ErrorCode::StaleControllerEpoch => 11,
            ErrorCode::OffsetMetadataTooLarge => 12,
            ErrorCode::OffsetsLoadInProgress => 14,
            ErrorCode::ConsumerCoordinatorNotAvailable => 15,
            ErrorCode::NotCoordinatorForConsumer => 16,
            ErrorCode::Unrecognized(code) => code,
        }
    }

    pub fn is_ok(self) -> bool {
        self == ErrorCode::NoError
    }
}

impl From<i16> for ErrorCode {
    fn from(code: i16) -> Self {
        match code {
            0 => ErrorCode::NoError,
            -1 => ErrorCode::Unknown,
            1 => ErrorCode::OffsetOutOfRange,
            2 => ErrorCode::InvalidMessage,
            3 => ErrorCode::UnknownTopicOrPartition,
            4 => ErrorCode::InvalidMessageSize,
            5 => ErrorCode::LeaderNotAvailable,
            6 => ErrorCode::NotLeaderForPartition,
            7 => ErrorCode::RequestTimedOut,
            8 => ErrorCode::BrokerNotAvailable,
            9 => ErrorCode::ReplicaNotAvailable,
            10 => ErrorCode::MessageSizeTooLarge,
            11 => ErrorCode::StaleControllerEpoch,
            12 => ErrorCode::OffsetMetadataTooLarge,
            14 => ErrorCode::OffsetsLoadInProgress,
            15 => ErrorCode::ConsumerCoordinatorNotAvailable,
            16 => ErrorCode::NotCoordinatorForConsumer,
            other => ErrorCode::Unrecognized(other),
        }
    }
}

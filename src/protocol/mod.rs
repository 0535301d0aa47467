//! Wire protocol codecs (Kafka protocol, API version 0).
//!
//! Frame: length (4 bytes BE) | api_key (2) | api_version (2) | correlation_id (4)
//! | client_id (string) | body. Responses: length (4 bytes BE) | correlation_id (4) | body.

mod constants;
pub mod crc32;
mod message;
mod reader;
mod request;
mod writer;

mod consumer_metadata;
mod fetch;
mod metadata;
mod offset;
mod offset_commit;
mod offset_fetch;
mod produce;

pub use constants::{
    ApiKey, ErrorCode, MessageCodec, API_VERSION, ATTRIBUTE_CODEC_MASK, CLIENT_REPLICA_ID,
    DEFAULT_CLIENT_ID,
};
pub use message::{decode_messages, encode_messages, MINIMUM_MESSAGE_SIZE};
pub use reader::BinaryReader;
pub use request::{correlation_id_of, frame, KafkaRequest, RequestHeader};
pub use writer::BinaryWriter;

pub use consumer_metadata::{ConsumerMetadataRequest, ConsumerMetadataResponse};
pub use fetch::{
    Fetch, FetchRequest, FetchResponse, DEFAULT_MAX_BYTES, DEFAULT_MAX_WAIT_TIME,
    DEFAULT_MIN_BYTES,
};
pub use metadata::{MetadataRequest, MetadataResponse, PartitionMetadata, Topic};
pub use offset::{Offset, OffsetRequest, OffsetResponse, EARLIEST_TIME, LATEST_TIME};
pub use offset_commit::{OffsetCommit, OffsetCommitRequest, OffsetCommitResponse};
pub use offset_fetch::{OffsetFetch, OffsetFetchRequest, OffsetFetchResponse};
pub use produce::{ProduceRequest, ProduceResponse};

//! Thorwire: client-side Kafka wire protocol core.
//!
//! Typed requests encode into exact byte frames ([`protocol`]), travel over a
//! reconnecting broker socket ([`transport`]), and responses decode back into
//! typed records.

pub mod error;
pub mod protocol;
pub mod transport;
pub mod types;

pub use error::{Result, WireError};
pub use protocol::{ErrorCode, KafkaRequest, MessageCodec, RequestHeader};
pub use transport::{BrokerSocket, Endpoint, SocketConfig, SocketState};
pub use types::{Broker, Message, OffsetPosition, Payload};

//! Resilient TCP transport to a single broker.

mod endpoint;
mod gate;
mod socket;

pub use endpoint::Endpoint;
pub use socket::{BrokerSocket, ReconnectObserver, SocketConfig, SocketState};

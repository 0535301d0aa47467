//! Error types for the wire protocol core.

use thiserror::Error;

/// Result alias for codec and transport operations.
pub type Result<T> = std::result::Result<T, WireError>;

/// Errors surfaced by the codecs and the broker socket.
///
/// Per-partition broker error codes are not errors at this level; they are
/// carried in the decoded response records as [`crate::ErrorCode`].
#[derive(Error, Debug)]
pub enum WireError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CRC validation mismatch during message decoding (offset {offset})")]
    CrcMismatch { offset: i64 },

    #[error("Codec type of {0} is not supported")]
    UnsupportedCodec(u8),

    #[error("Truncated input: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Lost connection to server: {0}")]
    ServerDisconnected(String),

    #[error("Connection to {0} was not established")]
    ServerUnreachable(String),

    #[error("Connection to {0} is disposed")]
    Disposed(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Unable to resolve host: {0}")]
    UnresolvedHostname(String),
}

impl WireError {
    /// True for failures caused by the connection itself (as opposed to
    /// codec failures or caller cancellation).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            WireError::Io(_)
                | WireError::ServerDisconnected(_)
                | WireError::ServerUnreachable(_)
                | WireError::Disposed(_)
        )
    }
}

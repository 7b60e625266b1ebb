//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while decoding packets or event payloads.
///
/// All variants are fatal for the packet that produced them but never for the
/// channel: callers log and skip the packet.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Packet text was empty.
    #[error("empty packet")]
    EmptyPacket,

    /// First character is not a known Engine.IO packet type.
    #[error("unknown engine packet type: {0:?}")]
    UnknownEngineType(char),

    /// Message packet does not start with a supported Socket.IO packet type.
    #[error("unsupported socket packet type: {0:?}")]
    UnsupportedSocketType(char),

    /// Event name is not part of the contract for this direction.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// Event arrived with a payload of the wrong shape.
    #[error("invalid payload for {event}: {reason}")]
    InvalidPayload {
        /// Event name
        event: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// Packet body is not valid JSON or not the expected JSON shape.
    #[error("malformed packet body: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

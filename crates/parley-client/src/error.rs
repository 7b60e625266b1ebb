//! Client error types.

use parley_core::SessionError;
use parley_proto::ProtocolError;
use thiserror::Error;

/// Errors returned by [`crate::Client::handle`].
///
/// Blank input is never an error; those intents are ignored silently.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Intent not valid in the current session state.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Intent needs a channel but none is established.
    #[error("not connected: no channel is established")]
    NotConnected,

    /// Inbound packet could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl ClientError {
    /// Whether this error should be shown to the user.
    ///
    /// Protocol errors come from the server and say nothing about what the
    /// user did, so they are only logged.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Protocol(_))
    }
}

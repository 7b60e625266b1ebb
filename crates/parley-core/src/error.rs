//! Error types for the session state machine.

use thiserror::Error;

use crate::session::SessionState;

/// Errors raised when an intent is not valid in the current state.
///
/// Empty input is never an error: blank usernames, room names, recipients and
/// messages are silently ignored by the callers before they reach the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Operation not permitted from the current state.
    #[error("invalid state transition: cannot {operation} while {state:?}")]
    InvalidState {
        /// State when the operation was attempted
        state: SessionState,
        /// Operation that was attempted
        operation: &'static str,
    },
}

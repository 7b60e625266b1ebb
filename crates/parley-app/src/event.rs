//! Application input events.
//!
//! This module defines [`AppEvent`], the comprehensive set of inputs that drive
//! the [`crate::App`] state machine.
//!
//! Events originate from two distinct sources:
//! - User interactions (Keyboard, Resize) and system ticks.
//! - Session notifications translated from the underlying client.

use parley_core::Message;

use crate::KeyInput;

/// Events processed by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Keyboard input.
    Key(KeyInput),

    /// Periodic tick.
    Tick,

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// Logged in; channel opening.
    LoggedIn {
        /// Trimmed username.
        username: String,
    },

    /// Channel finished opening.
    Connected,

    /// Back to the login screen. Everything session-scoped is gone.
    LoggedOut,

    /// Entered a room.
    RoomJoined {
        /// Room name.
        room: String,
    },

    /// Started a private chat.
    PrivateChatStarted {
        /// Recipient's username.
        recipient: String,
    },

    /// Message list replaced by a history snapshot.
    HistoryLoaded {
        /// New message list.
        messages: Vec<Message>,
    },

    /// Live message received.
    MessageReceived {
        /// The message.
        message: Message,
    },

    /// Peer typing status changed.
    TypingStatus {
        /// Status text. Empty when nobody is typing.
        status: String,
    },

    /// Server rejected the login. Raises an alert.
    LoginRejected {
        /// Server-provided reason, verbatim.
        reason: String,
    },

    /// Channel failed or dropped.
    ChannelLost {
        /// Human-readable cause.
        reason: String,
    },

    /// Error occurred.
    Error {
        /// Error description.
        message: String,
    },
}

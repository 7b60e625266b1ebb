//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Log in under a display name.
    Login {
        /// Username as typed.
        username: String,
    },

    /// Join or create a room.
    JoinRoom {
        /// Room name as typed.
        room_name: String,
    },

    /// Start a private chat.
    StartPrivateChat {
        /// Recipient as typed.
        recipient: String,
    },

    /// Send a message in the current conversation.
    SendMessage {
        /// Message text as typed.
        text: String,
    },

    /// The message input was edited.
    Keystroke,

    /// End the session.
    Logout,
}

impl AppAction {
    /// Whether the action goes through the protocol bridge.
    pub fn is_protocol(&self) -> bool {
        !matches!(self, Self::Render | Self::Quit)
    }
}

//! Observable application state types.
//!
//! These are the pieces of the "View Model" that are not already defined by
//! the core crate: which screen is showing, the channel's connection state and
//! the kind of prompt awaiting an answer.

/// Channel connection state, for UI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No channel.
    Disconnected,
    /// Channel opening.
    Connecting,
    /// Channel open.
    Connected,
}

/// Which screen the UI shows. Derived from the mirrored session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Username entry.
    Login,
    /// Logged in, not in any conversation yet.
    Lobby,
    /// In a room or private chat.
    Chat,
}

/// Question the App is waiting on. The input line holds the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Name of the room to join.
    RoomName,
    /// Username to start a private chat with.
    Recipient,
}

impl PromptKind {
    /// Label shown next to the input line.
    pub fn label(self) -> &'static str {
        match self {
            Self::RoomName => "Enter room name",
            Self::Recipient => "Enter recipient username",
        }
    }
}

//! Named chat events and their payloads.
//!
//! The event names are a fixed table per direction ([`OutboundEvent::NAMES`],
//! [`InboundEvent::NAMES`]). Anything outside the table is rejected at the
//! boundary with [`ProtocolError::UnknownEvent`] so downstream code only ever
//! sees typed events.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    EnginePacket, SocketPacket,
    errors::{ProtocolError, Result},
};

/// Event names as they appear on the wire.
pub mod names {
    /// `login` (out)
    pub const LOGIN: &str = "login";
    /// `loginError` (in)
    pub const LOGIN_ERROR: &str = "loginError";
    /// `messageHistory` (in)
    pub const MESSAGE_HISTORY: &str = "messageHistory";
    /// `joinRoom` (out)
    pub const JOIN_ROOM: &str = "joinRoom";
    /// `privateChat` (out)
    pub const PRIVATE_CHAT: &str = "privateChat";
    /// `typing` (both directions)
    pub const TYPING: &str = "typing";
    /// `chatMessage` (both directions)
    pub const CHAT_MESSAGE: &str = "chatMessage";
    /// `logout` (out)
    pub const LOGOUT: &str = "logout";
}

/// One entry of a room's history snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Username of the author.
    pub user: String,
    /// Message text without any sender prefix.
    pub message: String,
}

impl HistoryEntry {
    /// Create a history entry.
    pub fn new(user: impl Into<String>, message: impl Into<String>) -> Self {
        Self { user: user.into(), message: message.into() }
    }
}

/// Presence signal broadcast by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingSignal {
    /// Who is (or stopped) typing.
    pub username: String,
    /// Whether they are typing now.
    pub is_typing: bool,
}

/// Events the client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// Request a session under this display name.
    Login {
        /// Trimmed, non-empty username.
        username: String,
    },
    /// Join or create a named room.
    JoinRoom {
        /// Room name.
        room_name: String,
    },
    /// Request a one-to-one conversation.
    PrivateChat {
        /// Recipient's username.
        recipient: String,
    },
    /// Local presence signal.
    Typing {
        /// `true` on keystroke, `false` when the debounce deadline fires.
        is_typing: bool,
    },
    /// Send a message in the current conversation.
    ChatMessage {
        /// Message text as typed.
        text: String,
    },
    /// End the session.
    Logout,
}

impl OutboundEvent {
    /// Every outbound event name.
    pub const NAMES: [&'static str; 6] = [
        names::LOGIN,
        names::JOIN_ROOM,
        names::PRIVATE_CHAT,
        names::TYPING,
        names::CHAT_MESSAGE,
        names::LOGOUT,
    ];

    /// Wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => names::LOGIN,
            Self::JoinRoom { .. } => names::JOIN_ROOM,
            Self::PrivateChat { .. } => names::PRIVATE_CHAT,
            Self::Typing { .. } => names::TYPING,
            Self::ChatMessage { .. } => names::CHAT_MESSAGE,
            Self::Logout => names::LOGOUT,
        }
    }

    /// JSON payload. `None` for events without one.
    pub fn payload(&self) -> Option<Value> {
        match self {
            Self::Login { username } => Some(Value::String(username.clone())),
            Self::JoinRoom { room_name } => Some(Value::String(room_name.clone())),
            Self::PrivateChat { recipient } => Some(Value::String(recipient.clone())),
            Self::Typing { is_typing } => Some(Value::Bool(*is_typing)),
            Self::ChatMessage { text } => Some(Value::String(text.clone())),
            Self::Logout => None,
        }
    }

    /// Rebuild an outbound event from its wire parts (server side).
    pub fn from_parts(name: &str, payload: Option<Value>) -> Result<Self> {
        match name {
            names::LOGIN => Ok(Self::Login { username: decode(names::LOGIN, payload)? }),
            names::JOIN_ROOM => {
                Ok(Self::JoinRoom { room_name: decode(names::JOIN_ROOM, payload)? })
            },
            names::PRIVATE_CHAT => {
                Ok(Self::PrivateChat { recipient: decode(names::PRIVATE_CHAT, payload)? })
            },
            names::TYPING => Ok(Self::Typing { is_typing: decode(names::TYPING, payload)? }),
            names::CHAT_MESSAGE => {
                Ok(Self::ChatMessage { text: decode(names::CHAT_MESSAGE, payload)? })
            },
            names::LOGOUT => Ok(Self::Logout),
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }

    /// Wrap this event in the Engine.IO packet that carries it.
    pub fn into_packet(self) -> EnginePacket {
        EnginePacket::Message(SocketPacket::Event {
            name: self.name().to_string(),
            payload: self.payload(),
        })
    }

    /// Extract an outbound event from a decoded packet (server side).
    ///
    /// Returns `Ok(None)` for packets that carry no event.
    pub fn from_packet(packet: EnginePacket) -> Result<Option<Self>> {
        match packet {
            EnginePacket::Message(SocketPacket::Event { name, payload }) => {
                Self::from_parts(&name, payload).map(Some)
            },
            _ => Ok(None),
        }
    }
}

/// Events the server sends to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Login was rejected; `message` is shown to the user verbatim.
    LoginError {
        /// Server-provided reason.
        message: String,
    },
    /// History snapshot for the room just joined.
    MessageHistory {
        /// Entries in arrival order.
        entries: Vec<HistoryEntry>,
    },
    /// Peer presence signal.
    Typing(TypingSignal),
    /// Live message, already formatted for display by the server.
    ChatMessage {
        /// Display text.
        text: String,
    },
}

impl InboundEvent {
    /// Every inbound event name. These are the only events the client
    /// dispatches.
    pub const NAMES: [&'static str; 4] =
        [names::LOGIN_ERROR, names::MESSAGE_HISTORY, names::TYPING, names::CHAT_MESSAGE];

    /// Wire name of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoginError { .. } => names::LOGIN_ERROR,
            Self::MessageHistory { .. } => names::MESSAGE_HISTORY,
            Self::Typing(_) => names::TYPING,
            Self::ChatMessage { .. } => names::CHAT_MESSAGE,
        }
    }

    /// JSON payload.
    pub fn payload(&self) -> Value {
        match self {
            Self::LoginError { message } => Value::String(message.clone()),
            Self::MessageHistory { entries } => {
                Value::Array(entries.iter().map(history_value).collect())
            },
            Self::Typing(signal) => {
                let mut object = serde_json::Map::new();
                object.insert("username".into(), Value::String(signal.username.clone()));
                object.insert("isTyping".into(), Value::Bool(signal.is_typing));
                Value::Object(object)
            },
            Self::ChatMessage { text } => Value::String(text.clone()),
        }
    }

    /// Decode an inbound event from its wire parts.
    pub fn from_parts(name: &str, payload: Option<Value>) -> Result<Self> {
        match name {
            names::LOGIN_ERROR => {
                Ok(Self::LoginError { message: decode(names::LOGIN_ERROR, payload)? })
            },
            names::MESSAGE_HISTORY => {
                Ok(Self::MessageHistory { entries: decode(names::MESSAGE_HISTORY, payload)? })
            },
            names::TYPING => Ok(Self::Typing(decode(names::TYPING, payload)?)),
            names::CHAT_MESSAGE => {
                Ok(Self::ChatMessage { text: decode(names::CHAT_MESSAGE, payload)? })
            },
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }

    /// Wrap this event in the Engine.IO packet that carries it (server side).
    pub fn into_packet(self) -> EnginePacket {
        EnginePacket::Message(SocketPacket::Event {
            name: self.name().to_string(),
            payload: Some(self.payload()),
        })
    }

    /// Extract an inbound event from a decoded packet.
    ///
    /// Returns `Ok(None)` for packets that carry no event (pings, connect
    /// acknowledgements, ...).
    pub fn from_packet(packet: EnginePacket) -> Result<Option<Self>> {
        match packet {
            EnginePacket::Message(SocketPacket::Event { name, payload }) => {
                Self::from_parts(&name, payload).map(Some)
            },
            _ => Ok(None),
        }
    }
}

fn history_value(entry: &HistoryEntry) -> Value {
    let mut object = serde_json::Map::new();
    object.insert("user".into(), Value::String(entry.user.clone()));
    object.insert("message".into(), Value::String(entry.message.clone()));
    Value::Object(object)
}

fn decode<T: DeserializeOwned>(event: &'static str, payload: Option<Value>) -> Result<T> {
    let value = payload.ok_or_else(|| ProtocolError::InvalidPayload {
        event,
        reason: "missing payload".to_string(),
    })?;
    serde_json::from_value(value)
        .map_err(|e| ProtocolError::InvalidPayload { event, reason: e.to_string() })
}

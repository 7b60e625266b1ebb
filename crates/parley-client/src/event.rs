//! Client events and actions.

use parley_core::{Identity, Message};
use parley_proto::{InboundEvent, OutboundEvent};

use crate::lifecycle::ChannelId;

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - Forwarding user intents
/// - Reporting channel lifecycle and inbound events
/// - Driving time forward via ticks
///
/// Generic over `I` (Instant type) so the same client runs on the system
/// clock and on a simulated one.
#[derive(Debug, Clone)]
pub enum ClientEvent<I = std::time::Instant> {
    /// User wants to log in.
    Login {
        /// Display name as typed. Trimmed before use.
        username: String,
    },

    /// User wants to join (or create) a room.
    JoinRoom {
        /// Room name as typed.
        room_name: String,
    },

    /// User wants a one-to-one conversation.
    StartPrivateChat {
        /// Recipient as typed.
        recipient: String,
    },

    /// User submitted the message input.
    SendMessage {
        /// Message text as typed.
        text: String,
    },

    /// User edited the message input.
    Keystroke,

    /// User wants to end the session.
    Logout,

    /// Driver finished opening a channel.
    ChannelOpened {
        /// Channel that opened.
        channel: ChannelId,
    },

    /// Driver could not open a channel.
    ChannelFailed {
        /// Channel that failed.
        channel: ChannelId,
        /// Human-readable cause.
        reason: String,
    },

    /// Channel went away without being asked to.
    ChannelClosed {
        /// Channel that closed.
        channel: ChannelId,
    },

    /// Typed event received from the server.
    EventReceived {
        /// Channel it arrived on.
        channel: ChannelId,
        /// The event.
        event: InboundEvent,
    },

    /// Raw Engine.IO text received from the server.
    ///
    /// Decoded by the client; packets that carry no event are ignored.
    PacketReceived {
        /// Channel it arrived on.
        channel: ChannelId,
        /// One WebSocket text message.
        text: String,
    },

    /// Time tick for the typing deadline.
    Tick {
        /// Current time from the environment.
        now: I,
    },
}

/// Actions the client produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Open a channel bound to `identity`.
    OpenChannel {
        /// New channel generation.
        channel: ChannelId,
        /// Identity the channel belongs to.
        identity: Identity,
    },

    /// Emit an event on a channel.
    ///
    /// Must be written after any preceding `OpenChannel` for the same
    /// channel has completed.
    Send {
        /// Target channel.
        channel: ChannelId,
        /// Event to emit.
        event: OutboundEvent,
    },

    /// Close a channel.
    CloseChannel {
        /// Channel to close.
        channel: ChannelId,
    },

    /// Session entered `LoggedIn` with this username.
    LoggedIn {
        /// Trimmed username.
        username: String,
    },

    /// Session returned to `LoggedOut`. Log and typing status are empty.
    LoggedOut,

    /// Entered a room.
    RoomJoined {
        /// Room name.
        room: String,
    },

    /// Started a private chat. Any room was left.
    PrivateChatStarted {
        /// Recipient's username.
        recipient: String,
    },

    /// Message log replaced by a history snapshot.
    HistoryLoaded {
        /// New log contents.
        messages: Vec<Message>,
    },

    /// One live message appended to the log.
    MessageAppended {
        /// Appended message.
        message: Message,
    },

    /// Peer typing status text changed.
    TypingStatusChanged {
        /// New status. Empty when nobody is typing.
        status: String,
    },

    /// Server rejected the login. The session was reverted to `LoggedOut`.
    LoginRejected {
        /// Server-provided reason, verbatim.
        reason: String,
    },

    /// Live channel failed or closed. The session was reset.
    ChannelLost {
        /// Human-readable cause.
        reason: String,
    },

    /// Log message for debugging.
    Log {
        /// Log message.
        message: String,
    },
}

//! Client state machine.
//!
//! The `Client` routes user intents to guarded outbound emissions and inbound
//! events to state mutations. It owns the session, the message log, typing
//! presence and the channel lifecycle, and never performs I/O itself.

use parley_core::{
    Conversation, Identity, MessageLog, Session, SessionError, SessionState, TypingPresence,
    env::Environment, identity::normalize,
};
use parley_proto::{EnginePacket, InboundEvent, OutboundEvent, ProtocolError};

use crate::{
    error::ClientError,
    event::{ClientAction, ClientEvent},
    lifecycle::{ChannelCommand, ChannelId, ChannelLifecycle},
};

/// Reason reported when the live channel closes on its own.
const CHANNEL_CLOSED_REASON: &str = "connection closed by server";

/// Chat client: event router plus connection lifecycle.
pub struct Client<E: Environment> {
    /// Environment for time.
    env: E,

    /// Identity and conversation context.
    session: Session,

    /// Live channel generation.
    lifecycle: ChannelLifecycle,

    /// Messages for the current session.
    log: MessageLog,

    /// Local typing deadline and peer status.
    typing: TypingPresence<E::Instant>,
}

impl<E: Environment> Client<E> {
    /// Create a logged-out client.
    pub fn new(env: E) -> Self {
        Self {
            env,
            session: Session::new(),
            lifecycle: ChannelLifecycle::new(),
            log: MessageLog::new(),
            typing: TypingPresence::new(),
        }
    }

    /// Session state.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Identity and conversation context.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current conversation.
    pub fn conversation(&self) -> Option<&Conversation> {
        self.session.conversation()
    }

    /// Message log.
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Peer typing status text.
    pub fn typing_status(&self) -> &str {
        self.typing.status()
    }

    /// Whether a `typing(false)` is pending.
    pub fn typing_armed(&self) -> bool {
        self.typing.is_armed()
    }

    /// Live channel generation, open or opening.
    pub fn channel(&self) -> Option<ChannelId> {
        self.lifecycle.live()
    }

    /// Whether the live channel finished opening.
    pub fn is_connected(&self) -> bool {
        self.lifecycle.is_open()
    }

    /// Process an event and return resulting actions.
    pub fn handle(
        &mut self,
        event: ClientEvent<E::Instant>,
    ) -> Result<Vec<ClientAction>, ClientError> {
        match event {
            ClientEvent::Login { username } => self.handle_login(&username),
            ClientEvent::JoinRoom { room_name } => self.handle_join_room(&room_name),
            ClientEvent::StartPrivateChat { recipient } => self.handle_private_chat(&recipient),
            ClientEvent::SendMessage { text } => self.handle_send_message(text),
            ClientEvent::Keystroke => self.handle_keystroke(),
            ClientEvent::Logout => self.handle_logout(),
            ClientEvent::ChannelOpened { channel } => Ok(self.handle_channel_opened(channel)),
            ClientEvent::ChannelFailed { channel, reason } => {
                Ok(self.handle_channel_lost(channel, reason))
            },
            ClientEvent::ChannelClosed { channel } => {
                Ok(self.handle_channel_lost(channel, CHANNEL_CLOSED_REASON.to_string()))
            },
            ClientEvent::EventReceived { channel, event } => {
                Ok(self.handle_inbound(channel, event))
            },
            ClientEvent::PacketReceived { channel, text } => self.handle_packet(channel, &text),
            ClientEvent::Tick { now } => Ok(self.handle_tick(now)),
        }
    }

    fn handle_login(&mut self, username: &str) -> Result<Vec<ClientAction>, ClientError> {
        let Some(identity) = Identity::new(username) else {
            return Ok(vec![]);
        };

        self.session.login(identity.clone())?;

        let mut actions: Vec<ClientAction> = self
            .lifecycle
            .establish(identity.clone())
            .into_iter()
            .map(channel_action)
            .collect();

        let channel = self.live_channel()?;
        actions.push(ClientAction::Send {
            channel,
            event: OutboundEvent::Login { username: identity.username().to_string() },
        });
        actions.push(ClientAction::LoggedIn { username: identity.username().to_string() });
        actions.push(ClientAction::Log {
            message: format!("Logging in as {identity} on {channel}"),
        });

        Ok(actions)
    }

    fn handle_join_room(&mut self, room_name: &str) -> Result<Vec<ClientAction>, ClientError> {
        let Some(room) = normalize(room_name) else {
            return Ok(vec![]);
        };

        self.session.join_room(room.clone())?;
        let channel = self.live_channel()?;

        let mut actions = self.flush_typing(channel);
        actions.push(ClientAction::Send {
            channel,
            event: OutboundEvent::JoinRoom { room_name: room.clone() },
        });
        actions.push(ClientAction::RoomJoined { room });

        Ok(actions)
    }

    fn handle_private_chat(&mut self, recipient: &str) -> Result<Vec<ClientAction>, ClientError> {
        let Some(recipient) = normalize(recipient) else {
            return Ok(vec![]);
        };

        self.session.start_private_chat(recipient.clone())?;
        let channel = self.live_channel()?;

        let mut actions = self.flush_typing(channel);
        actions.push(ClientAction::Send {
            channel,
            event: OutboundEvent::PrivateChat { recipient: recipient.clone() },
        });
        actions.push(ClientAction::PrivateChatStarted { recipient });

        Ok(actions)
    }

    /// Emits the text as typed. The log only grows when the server echoes it.
    fn handle_send_message(&mut self, text: String) -> Result<Vec<ClientAction>, ClientError> {
        if text.trim().is_empty() {
            return Ok(vec![]);
        }

        self.require_logged_in("send a message")?;
        let channel = self.live_channel()?;

        Ok(vec![ClientAction::Send { channel, event: OutboundEvent::ChatMessage { text } }])
    }

    /// Keystrokes only count inside a room; elsewhere they are ignored.
    fn handle_keystroke(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        if self.session.state() != SessionState::RoomJoined {
            return Ok(vec![]);
        }

        let channel = self.live_channel()?;
        let event = self.typing.keystroke(self.env.now());

        Ok(vec![ClientAction::Send { channel, event }])
    }

    fn handle_logout(&mut self) -> Result<Vec<ClientAction>, ClientError> {
        let identity = self.session.logout()?;

        let mut actions = Vec::new();
        if let Some(channel) = self.lifecycle.live() {
            actions.push(ClientAction::Send { channel, event: OutboundEvent::Logout });
        }
        actions.extend(self.lifecycle.teardown().map(channel_action));

        self.log.clear();
        self.typing.reset();

        actions.push(ClientAction::LoggedOut);
        actions.push(ClientAction::Log { message: format!("Logged out {identity}") });

        Ok(actions)
    }

    fn handle_channel_opened(&mut self, channel: ChannelId) -> Vec<ClientAction> {
        if self.lifecycle.opened(channel) {
            vec![ClientAction::Log { message: format!("Channel {channel} open") }]
        } else {
            stale(channel, "open report")
        }
    }

    fn handle_channel_lost(&mut self, channel: ChannelId, reason: String) -> Vec<ClientAction> {
        if !self.lifecycle.lost(channel) {
            return stale(channel, "loss report");
        }

        self.reset_session();

        vec![
            ClientAction::ChannelLost { reason: reason.clone() },
            ClientAction::LoggedOut,
            ClientAction::Log { message: format!("Channel {channel} lost: {reason}") },
        ]
    }

    fn handle_packet(
        &mut self,
        channel: ChannelId,
        text: &str,
    ) -> Result<Vec<ClientAction>, ClientError> {
        if !self.lifecycle.is_live(channel) {
            return Ok(stale(channel, "packet"));
        }

        match EnginePacket::decode(text).and_then(InboundEvent::from_packet) {
            Ok(Some(event)) => Ok(self.handle_inbound(channel, event)),
            Ok(None) => Ok(vec![]),
            Err(ProtocolError::UnknownEvent(name)) => {
                Ok(vec![ClientAction::Log { message: format!("Ignoring unknown event {name:?}") }])
            },
            Err(e) => Err(e.into()),
        }
    }

    fn handle_inbound(&mut self, channel: ChannelId, event: InboundEvent) -> Vec<ClientAction> {
        if !self.lifecycle.is_live(channel) {
            return stale(channel, event.name());
        }

        match event {
            InboundEvent::LoginError { message } => self.handle_login_error(message),
            InboundEvent::MessageHistory { entries } => {
                self.log.hydrate(entries, self.session.identity());
                vec![ClientAction::HistoryLoaded { messages: self.log.entries().to_vec() }]
            },
            InboundEvent::Typing(signal) => {
                if self.typing.observe(&signal) {
                    vec![ClientAction::TypingStatusChanged {
                        status: self.typing.status().to_string(),
                    }]
                } else {
                    vec![]
                }
            },
            InboundEvent::ChatMessage { text } => {
                let message = self.log.append(text).clone();
                vec![ClientAction::MessageAppended { message }]
            },
        }
    }

    /// Reverts the optimistic login: the session ends as if logged out, but
    /// no `logout` is sent.
    fn handle_login_error(&mut self, reason: String) -> Vec<ClientAction> {
        let mut actions: Vec<ClientAction> =
            self.lifecycle.teardown().map(channel_action).into_iter().collect();
        self.reset_session();

        actions.push(ClientAction::LoginRejected { reason: reason.clone() });
        actions.push(ClientAction::LoggedOut);
        actions.push(ClientAction::Log { message: format!("Login rejected: {reason}") });
        actions
    }

    fn handle_tick(&mut self, now: E::Instant) -> Vec<ClientAction> {
        let Some(channel) = self.lifecycle.live() else {
            return vec![];
        };

        self.typing
            .poll(now)
            .map(|event| ClientAction::Send { channel, event })
            .into_iter()
            .collect()
    }

    /// Emit any pending `typing(false)` before leaving the current room.
    fn flush_typing(&mut self, channel: ChannelId) -> Vec<ClientAction> {
        self.typing.flush().map(|event| ClientAction::Send { channel, event }).into_iter().collect()
    }

    fn reset_session(&mut self) {
        self.session.reset();
        self.log.clear();
        self.typing.reset();
    }

    fn require_logged_in(&self, operation: &'static str) -> Result<(), ClientError> {
        match self.session.state() {
            SessionState::LoggedOut => Err(SessionError::InvalidState {
                state: SessionState::LoggedOut,
                operation,
            }
            .into()),
            SessionState::LoggedIn | SessionState::RoomJoined => Ok(()),
        }
    }

    fn live_channel(&self) -> Result<ChannelId, ClientError> {
        self.lifecycle.live().ok_or(ClientError::NotConnected)
    }
}

fn channel_action(command: ChannelCommand) -> ClientAction {
    match command {
        ChannelCommand::Open { channel, identity } => {
            ClientAction::OpenChannel { channel, identity }
        },
        ChannelCommand::Close { channel } => ClientAction::CloseChannel { channel },
    }
}

fn stale(channel: ChannelId, what: &str) -> Vec<ClientAction> {
    vec![ClientAction::Log { message: format!("Dropping {what} from stale channel {channel}") }]
}

//! Protocol-to-Application translation layer.
//!
//! The [`Bridge`] wraps the low-level [`parley_client::Client`] and adapts it
//! to the high-level application lifecycle.
//!
//! # Responsibilities
//!
//! - Converts high-level [`crate::AppAction`] into client events.
//! - Accumulates outgoing [`ChannelOp`]s, in order, to be performed by the
//!   driver in the next I/O cycle.
//! - Interprets results from the client and converts them back into
//!   [`crate::AppEvent`]s to update the UI.
//! - Manages time ticks generically to support both real-time execution and
//!   deterministic simulation.

use parley_client::{ChannelId, Client, ClientAction, ClientError, ClientEvent, Environment};
use parley_proto::{InboundEvent, OutboundEvent};

use crate::{AppAction, AppEvent};

/// Channel I/O for the driver, in the order it must happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOp {
    /// Open a channel. Later ops for it wait until this completes.
    Open {
        /// New channel generation.
        channel: ChannelId,
        /// Username the channel is opened for.
        username: String,
    },
    /// Write one event.
    Send {
        /// Target channel.
        channel: ChannelId,
        /// Event to write.
        event: OutboundEvent,
    },
    /// Close and release the channel.
    Close {
        /// Channel to close.
        channel: ChannelId,
    },
}

/// Bridge between App and Client protocol logic.
///
/// Generic over Environment to support both production and simulation.
/// The Instant type is determined by the Environment's associated type.
pub struct Bridge<E: Environment> {
    client: Client<E>,
    outgoing: Vec<ChannelOp>,
}

impl<E: Environment> Bridge<E> {
    /// Create a new Bridge with a logged-out client.
    pub fn new(env: E) -> Self {
        Self { client: Client::new(env), outgoing: Vec::new() }
    }

    /// The wrapped client, for inspection.
    pub fn client(&self) -> &Client<E> {
        &self.client
    }

    /// Process an App action and return resulting App events.
    pub fn process_app_action(&mut self, action: AppAction) -> Vec<AppEvent> {
        let event = match action {
            AppAction::Login { username } => ClientEvent::Login { username },
            AppAction::JoinRoom { room_name } => ClientEvent::JoinRoom { room_name },
            AppAction::StartPrivateChat { recipient } => {
                ClientEvent::StartPrivateChat { recipient }
            },
            AppAction::SendMessage { text } => ClientEvent::SendMessage { text },
            AppAction::Keystroke => ClientEvent::Keystroke,
            AppAction::Logout => ClientEvent::Logout,
            AppAction::Render | AppAction::Quit => return vec![],
        };
        self.dispatch(event)
    }

    /// Driver finished opening `channel`.
    pub fn handle_channel_opened(&mut self, channel: ChannelId) -> Vec<AppEvent> {
        let mut events = self.dispatch(ClientEvent::ChannelOpened { channel });
        if self.client.channel() == Some(channel) && self.client.is_connected() {
            events.push(AppEvent::Connected);
        }
        events
    }

    /// Driver could not open `channel`.
    pub fn handle_channel_failed(&mut self, channel: ChannelId, reason: String) -> Vec<AppEvent> {
        self.dispatch(ClientEvent::ChannelFailed { channel, reason })
    }

    /// `channel` went away.
    pub fn handle_channel_closed(&mut self, channel: ChannelId) -> Vec<AppEvent> {
        self.dispatch(ClientEvent::ChannelClosed { channel })
    }

    /// Raw packet text from the server.
    pub fn handle_packet(&mut self, channel: ChannelId, text: String) -> Vec<AppEvent> {
        self.dispatch(ClientEvent::PacketReceived { channel, text })
    }

    /// Typed event from the server.
    pub fn handle_event(&mut self, channel: ChannelId, event: InboundEvent) -> Vec<AppEvent> {
        self.dispatch(ClientEvent::EventReceived { channel, event })
    }

    /// Process a time tick.
    pub fn handle_tick(&mut self, now: E::Instant) -> Vec<AppEvent> {
        self.dispatch(ClientEvent::Tick { now })
    }

    /// Take pending channel operations.
    pub fn take_outgoing(&mut self) -> Vec<ChannelOp> {
        std::mem::take(&mut self.outgoing)
    }

    fn dispatch(&mut self, event: ClientEvent<E::Instant>) -> Vec<AppEvent> {
        let result = self.client.handle(event);
        self.handle_client_result(result)
    }

    fn handle_client_result(
        &mut self,
        result: Result<Vec<ClientAction>, ClientError>,
    ) -> Vec<AppEvent> {
        match result {
            Ok(actions) => self.process_client_actions(actions),
            Err(e) if e.is_user_facing() => {
                tracing::warn!(error = %e, "action rejected");
                vec![AppEvent::Error { message: e.to_string() }]
            },
            Err(e) => {
                tracing::warn!(error = %e, "dropping undecodable packet");
                vec![]
            },
        }
    }

    fn process_client_actions(&mut self, actions: Vec<ClientAction>) -> Vec<AppEvent> {
        let mut events = Vec::new();

        for action in actions {
            match action {
                ClientAction::OpenChannel { channel, identity } => {
                    tracing::info!(%channel, username = %identity, "opening channel");
                    let username = identity.username().to_string();
                    self.outgoing.push(ChannelOp::Open { channel, username });
                },
                ClientAction::Send { channel, event } => {
                    self.outgoing.push(ChannelOp::Send { channel, event });
                },
                ClientAction::CloseChannel { channel } => {
                    tracing::info!(%channel, "closing channel");
                    self.outgoing.push(ChannelOp::Close { channel });
                },
                ClientAction::LoggedIn { username } => events.push(AppEvent::LoggedIn { username }),
                ClientAction::LoggedOut => events.push(AppEvent::LoggedOut),
                ClientAction::RoomJoined { room } => events.push(AppEvent::RoomJoined { room }),
                ClientAction::PrivateChatStarted { recipient } => {
                    events.push(AppEvent::PrivateChatStarted { recipient });
                },
                ClientAction::HistoryLoaded { messages } => {
                    events.push(AppEvent::HistoryLoaded { messages });
                },
                ClientAction::MessageAppended { message } => {
                    events.push(AppEvent::MessageReceived { message });
                },
                ClientAction::TypingStatusChanged { status } => {
                    events.push(AppEvent::TypingStatus { status });
                },
                ClientAction::LoginRejected { reason } => {
                    tracing::info!(%reason, "login rejected");
                    events.push(AppEvent::LoginRejected { reason });
                },
                ClientAction::ChannelLost { reason } => {
                    tracing::warn!(%reason, "channel lost");
                    events.push(AppEvent::ChannelLost { reason });
                },
                ClientAction::Log { message } => tracing::debug!("{message}"),
            }
        }

        events
    }
}

//! In-process chat server for simulation.
//!
//! `SimServer` speaks the same wire text as the real messaging server: it
//! decodes `42["name",payload]` packets from clients and answers with encoded
//! packets queued per connection. Nothing touches the network, so tests and
//! the TUI's simulation mode get deterministic delivery.
//!
//! # Behavior
//!
//! - `login` claims a username. A name held by another live connection is
//!   answered with `loginError`.
//! - `joinRoom` moves the connection into a room and replies with the room's
//!   history. `privateChat` does the same for the one-to-one history.
//! - `chatMessage` is stored and echoed as `"user: text"` to everyone in the
//!   conversation, sender included.
//! - `typing` is relayed to everyone else in the conversation.
//! - `logout` releases the username.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::{BTreeMap, VecDeque},
    fmt,
    sync::{Arc, Mutex},
};

use parley_core::Conversation;
use parley_proto::{
    EnginePacket, HistoryEntry, InboundEvent, OutboundEvent, ProtocolError, TypingSignal,
};

/// Server-side connection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// Error type for the simulation server.
#[derive(Debug, Clone, PartialEq)]
pub enum SimServerError {
    /// Server is refusing new connections.
    Refused,
    /// Connection is unknown or already closed.
    UnknownConnection(ConnectionId),
    /// Client sent something the server cannot decode.
    Protocol(ProtocolError),
}

impl fmt::Display for SimServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Refused => f.write_str("connection refused"),
            Self::UnknownConnection(conn) => write!(f, "unknown connection {conn}"),
            Self::Protocol(e) => write!(f, "protocol error: {e}"),
        }
    }
}

impl std::error::Error for SimServerError {}

#[derive(Debug, Default)]
struct Connection {
    username: Option<String>,
    conversation: Option<Conversation>,
    outbox: VecDeque<String>,
    kicked: bool,
}

/// Simulated messaging server.
#[derive(Debug, Default)]
pub struct SimServer {
    connections: BTreeMap<ConnectionId, Connection>,
    rooms: BTreeMap<String, Vec<HistoryEntry>>,
    private_history: BTreeMap<(String, String), Vec<HistoryEntry>>,
    received: Vec<(ConnectionId, OutboundEvent)>,
    next_connection: u64,
    refusing: bool,
}

/// Server shared between simulated clients.
pub type SharedSimServer = Arc<Mutex<SimServer>>;

/// Create a server ready to be shared between drivers.
pub fn create_shared_server() -> SharedSimServer {
    Arc::new(Mutex::new(SimServer::new()))
}

impl SimServer {
    /// Create an empty server.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse (or accept again) new connections.
    pub fn set_refusing(&mut self, refusing: bool) {
        self.refusing = refusing;
    }

    /// Pre-populate a room's history.
    pub fn seed_room(&mut self, room: &str, entries: impl IntoIterator<Item = HistoryEntry>) {
        self.rooms.entry(room.to_string()).or_default().extend(entries);
    }

    /// Accept a new connection.
    pub fn connect(&mut self) -> Result<ConnectionId, SimServerError> {
        if self.refusing {
            return Err(SimServerError::Refused);
        }

        self.next_connection += 1;
        let conn = ConnectionId(self.next_connection);
        self.connections.insert(conn, Connection::default());
        tracing::debug!(%conn, "connection accepted");
        Ok(conn)
    }

    /// Client closed the connection. Its username is released.
    pub fn disconnect(&mut self, conn: ConnectionId) {
        if self.connections.remove(&conn).is_some() {
            tracing::debug!(%conn, "connection closed");
        }
    }

    /// Drop a connection from the server side.
    ///
    /// The owning driver reports the close to its client on the next receive.
    pub fn kick(&mut self, conn: ConnectionId) {
        if let Some(connection) = self.connections.get_mut(&conn) {
            connection.kicked = true;
            connection.username = None;
            connection.conversation = None;
            connection.outbox.clear();
        }
    }

    /// Whether the server dropped this connection.
    pub fn is_kicked(&self, conn: ConnectionId) -> bool {
        self.connections.get(&conn).is_some_and(|c| c.kicked)
    }

    /// Handle one packet of wire text from a client.
    pub fn receive(&mut self, conn: ConnectionId, text: &str) -> Result<(), SimServerError> {
        if !self.connections.get(&conn).is_some_and(|c| !c.kicked) {
            return Err(SimServerError::UnknownConnection(conn));
        }

        let packet = EnginePacket::decode(text).map_err(SimServerError::Protocol)?;
        let Some(event) = OutboundEvent::from_packet(packet).map_err(SimServerError::Protocol)?
        else {
            return Ok(());
        };

        self.received.push((conn, event.clone()));
        self.apply(conn, event);
        Ok(())
    }

    /// Take everything queued for `conn`, oldest first.
    pub fn take_outbox(&mut self, conn: ConnectionId) -> Vec<String> {
        self.connections.get_mut(&conn).map(|c| c.outbox.drain(..).collect()).unwrap_or_default()
    }

    /// Whether anything is queued for `conn`.
    pub fn has_outbox(&self, conn: ConnectionId) -> bool {
        self.connections.get(&conn).is_some_and(|c| !c.outbox.is_empty())
    }

    /// Every event received so far, in arrival order.
    pub fn received(&self) -> &[(ConnectionId, OutboundEvent)] {
        &self.received
    }

    /// Stored history for a room.
    pub fn room_history(&self, room: &str) -> &[HistoryEntry] {
        self.rooms.get(room).map(Vec::as_slice).unwrap_or_default()
    }

    /// Usernames currently logged in.
    pub fn online_users(&self) -> Vec<&str> {
        self.connections.values().filter_map(|c| c.username.as_deref()).collect()
    }

    fn apply(&mut self, conn: ConnectionId, event: OutboundEvent) {
        match event {
            OutboundEvent::Login { username } => self.login(conn, username),
            other => match self.username(conn) {
                Some(username) => self.apply_as(conn, username, other),
                None => tracing::debug!(%conn, event = other.name(), "ignoring event before login"),
            },
        }
    }

    fn apply_as(&mut self, conn: ConnectionId, username: String, event: OutboundEvent) {
        match event {
            OutboundEvent::Login { .. } => {},
            OutboundEvent::JoinRoom { room_name } => {
                let history = self.rooms.entry(room_name.clone()).or_default().clone();
                self.set_conversation(conn, Some(Conversation::Room(room_name)));
                self.deliver(conn, InboundEvent::MessageHistory { entries: history });
            },
            OutboundEvent::PrivateChat { recipient } => {
                let key = pair(&username, &recipient);
                let history = self.private_history.get(&key).cloned().unwrap_or_default();
                self.set_conversation(conn, Some(Conversation::Private(recipient)));
                self.deliver(conn, InboundEvent::MessageHistory { entries: history });
            },
            OutboundEvent::Typing { is_typing } => {
                let signal = TypingSignal { username: username.clone(), is_typing };
                for peer in self.audience(conn) {
                    if peer != conn {
                        self.deliver(peer, InboundEvent::Typing(signal.clone()));
                    }
                }
            },
            OutboundEvent::ChatMessage { text } => {
                let entry = HistoryEntry::new(username.clone(), text.clone());
                match self.conversation(conn) {
                    Some(Conversation::Room(room)) => {
                        self.rooms.entry(room).or_default().push(entry);
                    },
                    Some(Conversation::Private(peer)) => {
                        self.private_history.entry(pair(&username, &peer)).or_default().push(entry);
                    },
                    None => {
                        tracing::debug!(%conn, "dropping message outside a conversation");
                        return;
                    },
                }

                let line = format!("{username}: {text}");
                for peer in self.audience(conn) {
                    self.deliver(peer, InboundEvent::ChatMessage { text: line.clone() });
                }
            },
            OutboundEvent::Logout => {
                if let Some(connection) = self.connections.get_mut(&conn) {
                    connection.username = None;
                    connection.conversation = None;
                }
            },
        }
    }

    fn login(&mut self, conn: ConnectionId, username: String) {
        let taken = self
            .connections
            .iter()
            .any(|(id, c)| *id != conn && c.username.as_deref() == Some(username.as_str()));

        if taken {
            tracing::debug!(%conn, %username, "username taken");
            self.deliver(conn, InboundEvent::LoginError {
                message: format!("Username {username} is already taken"),
            });
            return;
        }

        if let Some(connection) = self.connections.get_mut(&conn) {
            connection.username = Some(username);
        }
    }

    /// Connections that see traffic in `conn`'s conversation, `conn` included.
    fn audience(&self, conn: ConnectionId) -> Vec<ConnectionId> {
        let (Some(me), Some(conversation)) = (self.username(conn), self.conversation(conn)) else {
            return vec![];
        };

        self.connections
            .iter()
            .filter(|(id, c)| {
                if **id == conn {
                    return true;
                }
                match (&conversation, &c.conversation, &c.username) {
                    (Conversation::Room(room), Some(Conversation::Room(theirs)), Some(_)) => {
                        room == theirs
                    },
                    (
                        Conversation::Private(peer),
                        Some(Conversation::Private(target)),
                        Some(name),
                    ) => name == peer && *target == me,
                    _ => false,
                }
            })
            .map(|(id, _)| *id)
            .collect()
    }

    fn deliver(&mut self, conn: ConnectionId, event: InboundEvent) {
        let text = match event.into_packet().encode() {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(%conn, error = %e, "failed to encode event");
                return;
            },
        };

        if let Some(connection) = self.connections.get_mut(&conn) {
            connection.outbox.push_back(text);
        }
    }

    fn username(&self, conn: ConnectionId) -> Option<String> {
        self.connections.get(&conn).and_then(|c| c.username.clone())
    }

    fn conversation(&self, conn: ConnectionId) -> Option<Conversation> {
        self.connections.get(&conn).and_then(|c| c.conversation.clone())
    }

    fn set_conversation(&mut self, conn: ConnectionId, conversation: Option<Conversation>) {
        if let Some(connection) = self.connections.get_mut(&conn) {
            connection.conversation = conversation;
        }
    }
}

/// Order-independent key for a private conversation.
fn pair(a: &str, b: &str) -> (String, String) {
    if a <= b { (a.to_string(), b.to_string()) } else { (b.to_string(), a.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send(server: &mut SimServer, conn: ConnectionId, event: OutboundEvent) {
        let text = event.into_packet().encode().unwrap();
        server.receive(conn, &text).unwrap();
    }

    fn inbound(server: &mut SimServer, conn: ConnectionId) -> Vec<InboundEvent> {
        server
            .take_outbox(conn)
            .iter()
            .filter_map(|text| {
                InboundEvent::from_packet(EnginePacket::decode(text).unwrap()).unwrap()
            })
            .collect()
    }

    fn login(server: &mut SimServer, name: &str) -> ConnectionId {
        let conn = server.connect().unwrap();
        send(server, conn, OutboundEvent::Login { username: name.into() });
        conn
    }

    #[test]
    fn duplicate_login_is_rejected() {
        let mut server = SimServer::new();
        let _alice = login(&mut server, "alice");
        let imposter = login(&mut server, "alice");

        let events = inbound(&mut server, imposter);
        assert!(matches!(events.as_slice(), [InboundEvent::LoginError { .. }]));
        assert_eq!(server.online_users(), vec!["alice"]);
    }

    #[test]
    fn join_replies_with_history() {
        let mut server = SimServer::new();
        server.seed_room("general", [HistoryEntry::new("bob", "hey")]);
        let alice = login(&mut server, "alice");

        send(&mut server, alice, OutboundEvent::JoinRoom { room_name: "general".into() });

        assert_eq!(inbound(&mut server, alice), vec![InboundEvent::MessageHistory {
            entries: vec![HistoryEntry::new("bob", "hey")]
        }]);
    }

    #[test]
    fn room_message_echoes_to_everyone() {
        let mut server = SimServer::new();
        let alice = login(&mut server, "alice");
        let bob = login(&mut server, "bob");
        let carol = login(&mut server, "carol");
        for conn in [alice, bob] {
            send(&mut server, conn, OutboundEvent::JoinRoom { room_name: "general".into() });
        }
        let _ = (inbound(&mut server, alice), inbound(&mut server, bob));

        send(&mut server, bob, OutboundEvent::ChatMessage { text: "hi".into() });

        let expected = vec![InboundEvent::ChatMessage { text: "bob: hi".into() }];
        assert_eq!(inbound(&mut server, alice), expected);
        assert_eq!(inbound(&mut server, bob), expected);
        assert!(inbound(&mut server, carol).is_empty());
        assert_eq!(server.room_history("general"), &[HistoryEntry::new("bob", "hi")]);
    }

    #[test]
    fn typing_skips_the_sender() {
        let mut server = SimServer::new();
        let alice = login(&mut server, "alice");
        let bob = login(&mut server, "bob");
        for conn in [alice, bob] {
            send(&mut server, conn, OutboundEvent::JoinRoom { room_name: "general".into() });
        }
        let _ = (inbound(&mut server, alice), inbound(&mut server, bob));

        send(&mut server, alice, OutboundEvent::Typing { is_typing: true });

        assert!(inbound(&mut server, alice).is_empty());
        assert_eq!(inbound(&mut server, bob), vec![InboundEvent::Typing(TypingSignal {
            username: "alice".into(),
            is_typing: true
        })]);
    }

    #[test]
    fn private_chat_reaches_only_the_pair() {
        let mut server = SimServer::new();
        let alice = login(&mut server, "alice");
        let bob = login(&mut server, "bob");
        send(&mut server, alice, OutboundEvent::PrivateChat { recipient: "bob".into() });
        send(&mut server, bob, OutboundEvent::PrivateChat { recipient: "alice".into() });
        let _ = (inbound(&mut server, alice), inbound(&mut server, bob));

        send(&mut server, alice, OutboundEvent::ChatMessage { text: "psst".into() });

        assert_eq!(inbound(&mut server, bob), vec![InboundEvent::ChatMessage {
            text: "alice: psst".into()
        }]);
        assert_eq!(inbound(&mut server, alice).len(), 1);
    }

    #[test]
    fn logout_frees_the_username() {
        let mut server = SimServer::new();
        let alice = login(&mut server, "alice");
        send(&mut server, alice, OutboundEvent::Logout);

        let again = login(&mut server, "alice");

        assert!(inbound(&mut server, again).is_empty());
    }

    #[test]
    fn kicked_connection_rejects_traffic() {
        let mut server = SimServer::new();
        let alice = login(&mut server, "alice");
        server.kick(alice);

        assert!(server.is_kicked(alice));
        assert_eq!(
            server.receive(alice, r#"42["logout"]"#),
            Err(SimServerError::UnknownConnection(alice))
        );
    }

    #[test]
    fn refusing_server_rejects_connections() {
        let mut server = SimServer::new();
        server.set_refusing(true);
        assert_eq!(server.connect(), Err(SimServerError::Refused));
    }
}

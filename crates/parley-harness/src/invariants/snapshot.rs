//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of the system at a point in time.
//! Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use parley_app::App;
use parley_client::{Client, Environment};
use parley_core::Conversation;
use serde::Serialize;

/// Snapshot of the entire system state.
///
/// Contains observable state from one or more clients for invariant checking.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemSnapshot {
    /// Per-client state snapshots.
    pub clients: Vec<ClientSnapshot>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no clients).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot with a single client.
    pub fn single(client: ClientSnapshot) -> Self {
        Self { clients: vec![client] }
    }

    /// Create a snapshot from multiple clients.
    pub fn from_clients(clients: Vec<ClientSnapshot>) -> Self {
        Self { clients }
    }

    /// Add a client snapshot.
    pub fn add_client(&mut self, client: ClientSnapshot) {
        self.clients.push(client);
    }
}

/// Snapshot of a single client's observable state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientSnapshot {
    /// Client label, for violation messages.
    pub id: u64,
    /// Session state name.
    pub state: String,
    /// Logged-in username.
    pub username: Option<String>,
    /// Live channel generation.
    pub channel: Option<u64>,
    /// Whether the live channel finished opening.
    pub connected: bool,
    /// Joined room.
    pub room: Option<String>,
    /// Private chat target.
    pub private_target: Option<String>,
    /// Whether a `typing(false)` is pending.
    pub typing_armed: bool,
    /// Peer typing status.
    pub typing_status: String,
    /// Message log as display lines.
    pub messages: Vec<String>,
    /// What the view model shows, when captured.
    pub view: Option<ViewSnapshot>,
}

/// Snapshot of the view model's mirrored session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewSnapshot {
    /// Username shown.
    pub username: Option<String>,
    /// Room shown.
    pub room: Option<String>,
    /// Private chat target shown.
    pub private_target: Option<String>,
    /// Messages shown, as display lines.
    pub messages: Vec<String>,
    /// Typing status shown.
    pub typing_status: String,
}

impl ClientSnapshot {
    /// Create an empty client snapshot.
    pub fn new(id: u64) -> Self {
        Self { id, state: "LoggedOut".into(), ..Default::default() }
    }

    /// Capture a client's session.
    pub fn from_client<E: Environment>(id: u64, client: &Client<E>) -> Self {
        let session = client.session();
        Self {
            id,
            state: format!("{:?}", client.state()),
            username: session.identity().map(|identity| identity.username().to_string()),
            channel: client.channel().map(|channel| channel.get()),
            connected: client.is_connected(),
            room: session.room().map(str::to_string),
            private_target: session.private_target().map(str::to_string),
            typing_armed: client.typing_armed(),
            typing_status: client.typing_status().to_string(),
            messages: client.log().display_lines(),
            view: None,
        }
    }

    /// Attach what the view model shows.
    #[must_use]
    pub fn with_view(mut self, app: &App) -> Self {
        let (room, private_target) = match app.conversation() {
            Some(Conversation::Room(room)) => (Some(room.clone()), None),
            Some(Conversation::Private(target)) => (None, Some(target.clone())),
            None => (None, None),
        };

        self.view = Some(ViewSnapshot {
            username: app.username().map(str::to_string),
            room,
            private_target,
            messages: app.messages().iter().map(|m| m.display_text().into_owned()).collect(),
            typing_status: app.typing_status().to_string(),
        });
        self
    }
}

//! Session state machine.
//!
//! Tracks who is logged in and which conversation they are in. The observable
//! [`SessionState`] is derived from those two fields rather than stored, so it
//! can never disagree with them.
//!
//! # State Machine
//!
//! ```text
//!              login                    joinRoom
//! ┌───────────┐ ───────> ┌──────────┐ ──────────> ┌────────────┐
//! │ LoggedOut │          │ LoggedIn │             │ RoomJoined │
//! └───────────┘ <─────── └──────────┘ <────────── └────────────┘
//!       ^         logout   │    ^     privateChat   │   │    ^
//!       │                  └────┘                   │   └────┘
//!       │                privateChat                │  joinRoom
//!       └───────────────────────────────────────────┘
//!                          logout
//! ```
//!
//! A private chat target and a room are mutually exclusive: both live in the
//! single [`Conversation`] slot, so entering one replaces the other.

use crate::{Identity, SessionError};

/// Observable session state. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No identity. Initial state.
    LoggedOut,
    /// Identity set, no room (possibly in a private chat).
    LoggedIn,
    /// Identity set and inside a named room.
    RoomJoined,
}

/// Current conversation context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversation {
    /// Shared, named room.
    Room(String),
    /// One-to-one conversation with the named recipient.
    Private(String),
}

/// Identity plus conversation context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    identity: Option<Identity>,
    /// Only ever `Some` while `identity` is `Some`.
    conversation: Option<Conversation>,
}

impl Session {
    /// Create a logged-out session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state, derived from identity and conversation.
    pub fn state(&self) -> SessionState {
        match (&self.identity, &self.conversation) {
            (None, _) => SessionState::LoggedOut,
            (Some(_), Some(Conversation::Room(_))) => SessionState::RoomJoined,
            (Some(_), _) => SessionState::LoggedIn,
        }
    }

    /// Logged-in identity. `None` when logged out.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Current conversation. `None` when logged out or not yet chatting.
    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    /// Joined room name. `None` unless in [`SessionState::RoomJoined`].
    pub fn room(&self) -> Option<&str> {
        match &self.conversation {
            Some(Conversation::Room(name)) => Some(name),
            _ => None,
        }
    }

    /// Private chat recipient. `None` unless in a private chat.
    pub fn private_target(&self) -> Option<&str> {
        match &self.conversation {
            Some(Conversation::Private(recipient)) => Some(recipient),
            _ => None,
        }
    }

    /// `LoggedOut -> LoggedIn`.
    pub fn login(&mut self, identity: Identity) -> Result<(), SessionError> {
        self.require_logged_out("login")?;
        self.identity = Some(identity);
        self.conversation = None;
        Ok(())
    }

    /// Enter a room, leaving any room or private chat.
    ///
    /// Returns the conversation that was left.
    pub fn join_room(&mut self, room: String) -> Result<Option<Conversation>, SessionError> {
        self.require_logged_in("join a room")?;
        Ok(self.conversation.replace(Conversation::Room(room)))
    }

    /// Start a private chat, leaving any room.
    ///
    /// Returns the conversation that was left.
    pub fn start_private_chat(
        &mut self,
        recipient: String,
    ) -> Result<Option<Conversation>, SessionError> {
        self.require_logged_in("start a private chat")?;
        Ok(self.conversation.replace(Conversation::Private(recipient)))
    }

    /// Any logged-in state `-> LoggedOut`. Returns the identity that was
    /// cleared.
    pub fn logout(&mut self) -> Result<Identity, SessionError> {
        let identity = self.identity.take().ok_or(SessionError::InvalidState {
            state: SessionState::LoggedOut,
            operation: "logout",
        })?;
        self.conversation = None;
        Ok(identity)
    }

    /// Clear everything unconditionally.
    pub fn reset(&mut self) {
        self.identity = None;
        self.conversation = None;
    }

    fn require_logged_in(&self, operation: &'static str) -> Result<(), SessionError> {
        match self.state() {
            SessionState::LoggedOut => {
                Err(SessionError::InvalidState { state: SessionState::LoggedOut, operation })
            },
            SessionState::LoggedIn | SessionState::RoomJoined => Ok(()),
        }
    }

    fn require_logged_out(&self, operation: &'static str) -> Result<(), SessionError> {
        match self.state() {
            SessionState::LoggedOut => Ok(()),
            state => Err(SessionError::InvalidState { state, operation }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Identity {
        Identity::new("alice").unwrap()
    }

    #[test]
    fn starts_logged_out() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::LoggedOut);
        assert!(session.identity().is_none());
        assert!(session.conversation().is_none());
    }

    #[test]
    fn login_then_join_room() {
        let mut session = Session::new();
        session.login(alice()).unwrap();
        assert_eq!(session.state(), SessionState::LoggedIn);

        let left = session.join_room("general".into()).unwrap();
        assert_eq!(left, None);
        assert_eq!(session.state(), SessionState::RoomJoined);
        assert_eq!(session.room(), Some("general"));
    }

    #[test]
    fn private_chat_leaves_room() {
        let mut session = Session::new();
        session.login(alice()).unwrap();
        session.join_room("general".into()).unwrap();

        let left = session.start_private_chat("carol".into()).unwrap();

        assert_eq!(left, Some(Conversation::Room("general".into())));
        assert_eq!(session.state(), SessionState::LoggedIn);
        assert_eq!(session.room(), None);
        assert_eq!(session.private_target(), Some("carol"));
    }

    #[test]
    fn joining_room_clears_private_target() {
        let mut session = Session::new();
        session.login(alice()).unwrap();
        session.start_private_chat("carol".into()).unwrap();
        session.join_room("general".into()).unwrap();

        assert_eq!(session.private_target(), None);
        assert_eq!(session.room(), Some("general"));
    }

    #[test]
    fn logout_clears_everything() {
        let mut session = Session::new();
        session.login(alice()).unwrap();
        session.join_room("general".into()).unwrap();

        let identity = session.logout().unwrap();

        assert_eq!(identity, alice());
        assert_eq!(session, Session::new());
    }

    #[test]
    fn rejects_out_of_order_intents() {
        let mut session = Session::new();
        assert_eq!(session.join_room("general".into()), Err(SessionError::InvalidState {
            state: SessionState::LoggedOut,
            operation: "join a room",
        }));
        assert!(session.start_private_chat("carol".into()).is_err());
        assert!(session.logout().is_err());

        session.login(alice()).unwrap();
        session.join_room("general".into()).unwrap();
        assert_eq!(session.login(alice()), Err(SessionError::InvalidState {
            state: SessionState::RoomJoined,
            operation: "login",
        }));
    }
}

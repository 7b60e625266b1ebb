//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use super::{Invariant, InvariantKind, InvariantResult, SystemSnapshot, Violation};

/// A channel exists exactly when an identity does.
///
/// Logging in establishes the channel; logout, a rejected login or a lost
/// channel clear both together.
pub struct ChannelMatchesIdentity;

impl Invariant for ChannelMatchesIdentity {
    fn kind(&self) -> InvariantKind {
        InvariantKind::ChannelMatchesIdentity
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.username.is_some() != client.channel.is_some() {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!(
                        "client {}: username {:?} with channel {:?}",
                        client.id, client.username, client.channel
                    ),
                });
            }
            if client.connected && client.channel.is_none() {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!("client {}: connected without a channel", client.id),
                });
            }
        }
        Ok(())
    }
}

/// Room context and private chat target are mutually exclusive.
///
/// `RoomJoined` holds exactly when a room is set.
pub struct ConversationExclusive;

impl Invariant for ConversationExclusive {
    fn kind(&self) -> InvariantKind {
        InvariantKind::ConversationExclusive
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.room.is_some() && client.private_target.is_some() {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!(
                        "client {}: in room {:?} and private chat with {:?}",
                        client.id, client.room, client.private_target
                    ),
                });
            }
            if (client.state == "RoomJoined") != client.room.is_some() {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!(
                        "client {}: state {} with room {:?}",
                        client.id, client.state, client.room
                    ),
                });
            }
        }
        Ok(())
    }
}

/// The local typing deadline is only ever armed while in a room.
pub struct TypingOnlyInRoom;

impl Invariant for TypingOnlyInRoom {
    fn kind(&self) -> InvariantKind {
        InvariantKind::TypingOnlyInRoom
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.typing_armed && client.room.is_none() {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!("client {}: typing armed outside a room", client.id),
                });
            }
        }
        Ok(())
    }
}

/// A logged-out client holds no session-scoped state.
pub struct LoggedOutIsEmpty;

impl Invariant for LoggedOutIsEmpty {
    fn kind(&self) -> InvariantKind {
        InvariantKind::LoggedOutIsEmpty
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in state.clients.iter().filter(|c| c.username.is_none()) {
            let leftovers = [
                (!client.messages.is_empty(), "messages"),
                (!client.typing_status.is_empty(), "typing status"),
                (client.room.is_some(), "room"),
                (client.private_target.is_some(), "private chat"),
            ];
            if let Some((_, what)) = leftovers.iter().find(|(present, _)| *present) {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!("client {}: {what} survived logout", client.id),
                });
            }
        }
        Ok(())
    }
}

/// The view model shows exactly the client's session.
///
/// Skipped for snapshots taken without a view.
pub struct ViewMirrorsClient;

impl Invariant for ViewMirrorsClient {
    fn kind(&self) -> InvariantKind {
        InvariantKind::ViewMirrorsClient
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let Some(view) = &client.view else { continue };

            let mismatch = if view.username != client.username {
                Some(format!("username {:?} vs {:?}", view.username, client.username))
            } else if view.room != client.room || view.private_target != client.private_target {
                Some(format!(
                    "conversation {:?}/{:?} vs {:?}/{:?}",
                    view.room, view.private_target, client.room, client.private_target
                ))
            } else if view.messages != client.messages {
                Some(format!("{} messages vs {}", view.messages.len(), client.messages.len()))
            } else if view.typing_status != client.typing_status {
                Some(format!("typing {:?} vs {:?}", view.typing_status, client.typing_status))
            } else {
                None
            };

            if let Some(detail) = mismatch {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!("client {}: view shows {detail}", client.id),
                });
            }
        }
        Ok(())
    }
}

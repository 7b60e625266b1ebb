//! Core state machines for the Parley chat client.
//!
//! Everything in this crate is Sans-IO: no sockets, no clocks, no tasks. Time
//! enters through the [`env::Environment`] abstraction or as explicit `now`
//! arguments, so the same code runs against the real clock in production and a
//! virtual one in simulation.
//!
//! # Components
//!
//! - [`Session`]: identity and conversation context, from which the observable
//!   [`SessionState`] is derived
//! - [`MessageLog`]: append-only, hydratable list of display-ready messages
//! - [`TypingPresence`]: debounced local presence and latched remote status

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod error;
pub mod identity;
pub mod message_log;
pub mod session;
pub mod typing;

pub use error::SessionError;
pub use identity::Identity;
pub use message_log::{Message, MessageLog};
pub use session::{Conversation, Session, SessionState};
pub use typing::{TYPING_STOP_DELAY, TypingPresence};

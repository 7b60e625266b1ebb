//! Client
//!
//! Action-based client state machine for the Parley chat protocol. Routes user
//! intents and server events, and owns the per-identity channel lifecycle.
//!
//! # Architecture
//!
//! The client follows the Sans-IO and Action-Based patterns of
//! [`parley_core`]. It receives events ([`ClientEvent`]), processes them
//! through pure state machine logic, and returns actions ([`ClientAction`]) for
//! the caller to execute.
//!
//! # Components
//!
//! - [`Client`]: Event router and top-level state machine
//! - [`ChannelLifecycle`]: One channel generation per identity
//! - [`ClientEvent`]: Events fed into the client
//! - [`ClientAction`]: Actions produced by the client
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::ConnectedChannel`]: Channel over a Socket.IO WebSocket
//! - [`transport::connect`]: Connect to a server

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod error;
mod event;
mod lifecycle;

#[cfg(feature = "transport")]
pub mod transport;

pub use client::Client;
pub use error::ClientError;
pub use event::{ClientAction, ClientEvent};
pub use lifecycle::{ChannelCommand, ChannelId, ChannelLifecycle};
pub use parley_core::{Identity, Message, SessionState, env::Environment};

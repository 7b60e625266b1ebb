//! Deterministic simulation harness for Parley.
//!
//! In-process implementations of the server, the clock and the I/O driver so
//! the production [`parley_app::Runtime`] can be exercised end to end without
//! a network or wall-clock time.
//!
//! # Components
//!
//! - [`SimEnv`]: virtual clock shared by every simulated client
//! - [`SimServer`]: the server side of the chat event contract
//! - [`SimDriver`]: [`parley_app::Driver`] backed by a shared [`SimServer`]
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the session
//! invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_server;

pub use invariants::{
    ChannelMatchesIdentity, ClientSnapshot, ConversationExclusive, Invariant, InvariantKind,
    InvariantRegistry, InvariantResult, LoggedOutIsEmpty, SystemSnapshot, TypingOnlyInRoom,
    ViewMirrorsClient, ViewSnapshot, Violation,
};
pub use sim_driver::{SimDriver, SimDriverError};
pub use sim_env::{SimEnv, SimInstant};
pub use sim_server::{
    ConnectionId, SharedSimServer, SimServer, SimServerError, create_shared_server,
};

//! Application layer for Parley
//!
//! Pure state machines and generic runtime for UI and protocol orchestration,
//! enabling deterministic simulation testing with the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`App`]: UI state machine (input line, prompts, alert, mirrored session)
//! - [`Bridge`]: Protocol bridge (translates App actions to Client events)
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod bridge;
mod driver;
mod event;
mod input;
mod runtime;
mod state;

pub use action::AppAction;
pub use app::App;
pub use bridge::{Bridge, ChannelOp};
pub use driver::{ChannelInbound, Driver};
pub use event::AppEvent;
pub use input::KeyInput;
pub use parley_client::ChannelId;
pub use parley_core::{Conversation, Message};
pub use runtime::Runtime;
pub use state::{ConnectionState, PromptKind, Screen};

//! Terminal UI for Parley
//!
//! A thin shell over [`parley_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`parley_app::Runtime`].
//!
//! This crate handles rendering, key input, the channel transport and the
//! in-process simulation mode.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod server;
pub mod system_env;
pub mod terminal;
pub mod ui;

pub use config::{Args, ClientConfig, ServerMode};
pub use parley_app::{
    App, AppAction, AppEvent, Bridge, ConnectionState, Driver, KeyInput, Runtime, Screen,
};
pub use system_env::SystemEnv;
pub use terminal::{TerminalDriver, TerminalError};

//! Command-line arguments and client configuration.

use std::{path::PathBuf, time::Duration};

use clap::Parser;

/// Server used when `--server` is not given.
pub const DEFAULT_SERVER: &str = "https://chat-api-ruddy.vercel.app";

/// Parley terminal chat client
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Terminal client for the Parley real-time chat service")]
#[command(version)]
pub struct Args {
    /// Chat server base URL
    #[arg(short, long, default_value = DEFAULT_SERVER)]
    pub server: String,

    /// Talk to an in-process simulated server instead of the network
    #[arg(long)]
    pub simulate: bool,

    /// Log in under this name on start-up
    #[arg(short, long)]
    pub username: Option<String>,

    /// Runtime tick cadence in milliseconds
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,

    /// Log filter used when `RUST_LOG` is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Write logs to this file. No logging without it.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Where channels go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    /// WebSocket to the configured server.
    Remote,
    /// In-process simulated server.
    Simulated,
}

/// Everything the terminal client needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server base URL.
    pub server: String,
    /// Network or simulation.
    pub mode: ServerMode,
    /// Name to log in with before the first frame.
    pub username: Option<String>,
    /// How long input polling waits before a tick.
    pub tick: Duration,
    /// Log filter fallback.
    pub log_level: String,
    /// Log destination.
    pub log_file: Option<PathBuf>,
}

impl From<Args> for ClientConfig {
    fn from(args: Args) -> Self {
        let mode = if args.simulate { ServerMode::Simulated } else { ServerMode::Remote };
        let server = match mode {
            ServerMode::Remote => args.server,
            ServerMode::Simulated => "sim://local".to_string(),
        };

        Self {
            server,
            mode,
            username: args.username.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()),
            tick: Duration::from_millis(args.tick_ms),
            log_level: args.log_level,
            log_file: args.log_file,
        }
    }
}

//! Parley TUI entry point.

use std::{fs::File, sync::Arc};

use clap::Parser;
use parley_tui::{Args, ClientConfig, Runtime, SystemEnv, TerminalDriver};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from(Args::parse());
    init_logging(&config)?;

    tracing::info!(server = %config.server, mode = ?config.mode, "starting");

    let driver = TerminalDriver::new(&config)?;
    let mut runtime = Runtime::new(driver, SystemEnv::new(), config.server.clone());

    if let Some(username) = &config.username {
        runtime.auto_login(username).await?;
    }

    Ok(runtime.run().await?)
}

/// Log to `--log-file`. The terminal owns stdout, so there is no fallback.
fn init_logging(config: &ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = &config.log_file else {
        return Ok(());
    };

    let file = File::create(path)?;
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Arc::new(file)).with_ansi(false).with_target(true))
        .try_init()?;

    Ok(())
}

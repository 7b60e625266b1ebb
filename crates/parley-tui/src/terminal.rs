//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. Channels are WebSockets, or
//! connections on an in-process simulated server.

use std::{
    collections::VecDeque,
    io::{self, Stdout, stdout},
    time::{Duration, Instant},
};

use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use parley_app::{App, AppEvent, ChannelId, ChannelInbound, Driver, KeyInput};
use parley_client::transport::{self, ConnectedChannel, TransportError};
use parley_harness::{SharedSimServer, SimServerError};
use parley_proto::OutboundEvent;
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::{
    ClientConfig, ServerMode,
    server::{self, ServerHandle},
    ui,
};

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Simulated server refused the channel.
    #[error("simulated server: {0}")]
    Simulated(#[from] SimServerError),

    /// Channel send error.
    #[error("channel send error")]
    ChannelSend,
}

/// Open channel, over the network or in-process.
enum Link {
    Remote(ConnectedChannel),
    Simulated(ServerHandle),
}

impl Link {
    fn sender(&self) -> &mpsc::Sender<OutboundEvent> {
        match self {
            Self::Remote(conn) => &conn.to_server,
            Self::Simulated(handle) => &handle.to_server,
        }
    }

    fn receiver(&mut self) -> &mut mpsc::Receiver<String> {
        match self {
            Self::Remote(conn) => &mut conn.from_server,
            Self::Simulated(handle) => &mut handle.from_server,
        }
    }

    /// Deliver queued events, then close.
    async fn close(self) {
        match self {
            Self::Remote(conn) => conn.close().await,
            Self::Simulated(handle) => handle.close().await,
        }
    }
}

/// Where new channels are opened.
enum Backend {
    Remote { server: String },
    Simulated { world: SharedSimServer },
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Handles terminal I/O (crossterm), rendering (ratatui), and the channel
/// for the current identity. At most one channel is open: opening a new one
/// drops the previous.
///
/// Closing a channel waits for its queued events to be written, so a
/// `logout` sent just before the close reaches the server.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    backend: Backend,
    channel: Option<(ChannelId, Link)>,
    /// Inbound items that arrived while waiting for input.
    inbound: VecDeque<ChannelInbound>,
    tick: Duration,
}

impl TerminalDriver {
    /// Create a new terminal driver and take over the terminal.
    pub fn new(config: &ClientConfig) -> Result<Self, TerminalError> {
        let backend = match config.mode {
            ServerMode::Remote => Backend::Remote { server: config.server.clone() },
            ServerMode::Simulated => Backend::Simulated { world: server::simulated_world() },
        };

        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

        Ok(Self {
            terminal,
            event_stream: EventStream::new(),
            backend,
            channel: None,
            inbound: VecDeque::new(),
            tick: config.tick,
        })
    }

    /// Convert crossterm `KeyCode` to `KeyInput`.
    fn convert_key(code: KeyCode) -> Option<KeyInput> {
        match code {
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Delete => Some(KeyInput::Delete),
            KeyCode::Esc => Some(KeyInput::Esc),
            KeyCode::Left => Some(KeyInput::Left),
            KeyCode::Right => Some(KeyInput::Right),
            KeyCode::Home => Some(KeyInput::Home),
            KeyCode::End => Some(KeyInput::End),
            _ => None,
        }
    }

    fn live_channel(&self, channel: ChannelId) -> Option<&Link> {
        self.channel.as_ref().filter(|(id, _)| *id == channel).map(|(_, link)| link)
    }
}

/// Next item from the open channel. Pending forever without one.
async fn next_inbound(channel: &mut Option<(ChannelId, Link)>) -> ChannelInbound {
    let Some((id, link)) = channel else {
        return std::future::pending().await;
    };

    match link.receiver().recv().await {
        Some(text) => ChannelInbound::Packet { channel: *id, text },
        None => ChannelInbound::Closed { channel: *id },
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;
    type Instant = Instant;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        if !self.inbound.is_empty() {
            return Ok(None);
        }

        tokio::select! {
            biased;

            // Terminal events
            maybe_event = self.event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) if key_event.kind == KeyEventKind::Press => {
                        Ok(Self::convert_key(key_event.code).map(AppEvent::Key))
                    },
                    Some(Ok(Event::Resize(cols, rows))) => Ok(Some(AppEvent::Resize(cols, rows))),
                    Some(Err(e)) => Err(TerminalError::Io(e)),
                    _ => Ok(None),
                }
            }

            // Channel traffic wakes the loop without waiting for a tick
            inbound = next_inbound(&mut self.channel) => {
                self.inbound.push_back(inbound);
                Ok(None)
            }

            // Tick timeout
            () = tokio::time::sleep(self.tick) => Ok(Some(AppEvent::Tick)),
        }
    }

    async fn open_channel(
        &mut self,
        channel: ChannelId,
        username: &str,
    ) -> Result<(), Self::Error> {
        let link = match &self.backend {
            Backend::Remote { server } => Link::Remote(transport::connect(server).await?),
            Backend::Simulated { world } => Link::Simulated(server::spawn_connection(world)?),
        };

        tracing::info!(%channel, %username, "channel open");
        if let Some((old, link)) = self.channel.replace((channel, link)) {
            tracing::debug!(channel = %old, "replacing channel");
            link.close().await;
        }
        Ok(())
    }

    async fn send_event(
        &mut self,
        channel: ChannelId,
        event: OutboundEvent,
    ) -> Result<(), Self::Error> {
        let Some(link) = self.live_channel(channel) else {
            tracing::debug!(%channel, event = event.name(), "dropping event for closed channel");
            return Ok(());
        };

        let sender = link.sender().clone();
        sender.send(event).await.map_err(|_| TerminalError::ChannelSend)
    }

    async fn recv(&mut self) -> Option<ChannelInbound> {
        if let Some(inbound) = self.inbound.pop_front() {
            return Some(inbound);
        }

        let (id, link) = self.channel.as_mut()?;
        match link.receiver().try_recv() {
            Ok(text) => Some(ChannelInbound::Packet { channel: *id, text }),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                Some(ChannelInbound::Closed { channel: *id })
            },
        }
    }

    async fn close_channel(&mut self, channel: ChannelId) {
        if self.live_channel(channel).is_none() {
            return;
        }
        self.inbound.retain(|item| match item {
            ChannelInbound::Packet { channel: ch, .. } | ChannelInbound::Closed { channel: ch } => {
                *ch != channel
            },
        });
        if let Some((_, link)) = self.channel.take() {
            link.close().await;
            tracing::info!(%channel, "channel closed");
        }
    }

    fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        self.terminal.draw(|frame| ui::render(frame, app))?;
        Ok(())
    }

    async fn stop(&mut self) {
        self.inbound.clear();
        if let Some((_, link)) = self.channel.take() {
            link.close().await;
        }
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        // An open channel is aborted with its link.
        self.channel = None;
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

#[cfg(test)]
mod tests {
    use parley_client::{Client, ClientEvent};

    use super::*;
    use crate::SystemEnv;

    fn first_channel() -> ChannelId {
        let mut client = Client::new(SystemEnv::new());
        let _ = client.handle(ClientEvent::Login { username: "alice".into() });
        client.channel().unwrap()
    }

    #[test]
    fn arrow_keys_map_to_cursor_moves() {
        assert_eq!(TerminalDriver::convert_key(KeyCode::Left), Some(KeyInput::Left));
        assert_eq!(TerminalDriver::convert_key(KeyCode::Char('x')), Some(KeyInput::Char('x')));
        assert_eq!(TerminalDriver::convert_key(KeyCode::Tab), None);
    }

    #[tokio::test]
    async fn next_inbound_reports_closed_channel() {
        let world = server::simulated_world();
        let mut handle = server::spawn_connection(&world).unwrap();
        let channel = first_channel();

        // Closing the event sender ends the server task, which drops its
        // side of the packet channel.
        let (detached, _) = mpsc::channel(1);
        drop(std::mem::replace(&mut handle.to_server, detached));
        let mut slot = Some((channel, Link::Simulated(handle)));

        assert_eq!(next_inbound(&mut slot).await, ChannelInbound::Closed { channel });
    }

    #[tokio::test]
    async fn link_close_delivers_logout() {
        let world = server::simulated_world();
        let handle = server::spawn_connection(&world).unwrap();
        let link = Link::Simulated(handle);

        link.sender().send(OutboundEvent::Login { username: "alice".into() }).await.unwrap();
        link.sender().send(OutboundEvent::Logout).await.unwrap();
        link.close().await;

        let server = world.lock().unwrap();
        let received: Vec<_> = server.received().iter().map(|(_, event)| event.clone()).collect();
        assert_eq!(received, vec![
            OutboundEvent::Login { username: "alice".into() },
            OutboundEvent::Logout
        ]);
    }
}

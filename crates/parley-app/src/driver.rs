//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::{future::Future, ops::Sub, time::Duration};

use parley_client::ChannelId;
use parley_proto::OutboundEvent;

use crate::{App, AppEvent};

/// Something that arrived on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelInbound {
    /// One Engine.IO text packet.
    Packet {
        /// Channel it arrived on.
        channel: ChannelId,
        /// Packet text.
        text: String,
    },
    /// The channel closed from the server side.
    Closed {
        /// Channel that closed.
        channel: ChannelId,
    },
}

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in production TUI and simulation.
///
/// # Implementations
///
/// - **TUI**: Uses crossterm for terminal events, tokio-tungstenite for the
///   WebSocket channel
/// - **Simulation**: In-process server and virtual clock
///
/// # Associated Types
///
/// - [`Error`](Driver::Error): Platform-specific error type
/// - [`Instant`](Driver::Instant): Time representation (real or virtual)
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Poll for the next input event.
    ///
    /// Returns available events or `None` if no events are ready.
    fn poll_event(
        &mut self,
    ) -> impl Future<Output = Result<Option<AppEvent>, Self::Error>> + Send;

    /// Open a channel for `username`.
    ///
    /// Resolves once the channel can carry events. An error here is reported
    /// to the client as a failed channel, not treated as fatal.
    fn open_channel(
        &mut self,
        channel: ChannelId,
        username: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Write an event on `channel`.
    ///
    /// Events for a channel that is not open are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is open but the write fails.
    fn send_event(
        &mut self,
        channel: ChannelId,
        event: OutboundEvent,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receive the next ready inbound item. `None` if nothing is ready.
    fn recv(&mut self) -> impl Future<Output = Option<ChannelInbound>> + Send;

    /// Close `channel` and release its resources.
    ///
    /// Events already written with [`send_event`](Driver::send_event) are
    /// delivered before the channel goes away.
    fn close_channel(&mut self, channel: ChannelId) -> impl Future<Output = ()> + Send;

    /// Check if a channel is open.
    fn is_connected(&self) -> bool;

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Close any open channel and clean up resources.
    fn stop(&mut self) -> impl Future<Output = ()> + Send;
}

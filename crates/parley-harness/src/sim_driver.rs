//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as `TerminalDriver` but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`parley_app::Runtime`] orchestration code runs in both production and
//! simulation.
//!
//! Channels map onto [`SimServer`](crate::SimServer) connections. Outbound
//! events are encoded to wire text before the server sees them and inbound
//! packets arrive as wire text, so the codec runs on every hop.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::{BTreeMap, VecDeque},
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use parley_app::{App, AppEvent, Bridge, ChannelId, ChannelInbound, Driver};
use parley_core::env::Environment;
use parley_proto::OutboundEvent;

use crate::{
    SharedSimServer, SimEnv, SimInstant, SimServer,
    invariants::{ClientSnapshot, InvariantRegistry, SystemSnapshot},
    sim_server::ConnectionId,
};

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// Shared state for event injection.
///
/// This allows injection from outside async contexts.
#[derive(Default)]
struct SharedState {
    pending_events: VecDeque<AppEvent>,
    inbound: VecDeque<ChannelInbound>,
    channels: BTreeMap<ChannelId, ConnectionId>,
    sent: Vec<(ChannelId, OutboundEvent)>,
    renders: usize,
}

/// Simulation driver for deterministic testing.
///
/// Implements [`Driver`] trait so the same [`parley_app::Runtime`]
/// orchestration code runs in both production TUI and simulation tests.
pub struct SimDriver {
    state: Arc<Mutex<SharedState>>,
    server: SharedSimServer,
    env: SimEnv,
    invariants: Option<InvariantRegistry>,
}

impl SimDriver {
    /// Create a driver talking to `server` on the shared clock `env`.
    pub fn new(server: SharedSimServer, env: SimEnv) -> Self {
        Self { state: Arc::default(), server, env, invariants: None }
    }

    /// Enable invariant checking.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    /// Inject an `AppEvent` for processing.
    pub fn inject_event(&self, event: AppEvent) {
        self.lock_state().pending_events.push_back(event);
    }

    /// Inject a tick event.
    pub fn inject_tick(&self) {
        self.inject_event(AppEvent::Tick);
    }

    /// Inject raw packet text as if the server sent it on the live channel.
    pub fn inject_packet(&self, channel: ChannelId, text: impl Into<String>) {
        self.lock_state().inbound.push_back(ChannelInbound::Packet { channel, text: text.into() });
    }

    /// Every event written to a channel so far.
    pub fn sent(&self) -> Vec<(ChannelId, OutboundEvent)> {
        self.lock_state().sent.clone()
    }

    /// Number of frames rendered.
    pub fn renders(&self) -> usize {
        self.lock_state().renders
    }

    /// Server connection behind `channel`, if open.
    pub fn connection(&self, channel: ChannelId) -> Option<ConnectionId> {
        self.lock_state().channels.get(&channel).copied()
    }

    /// Check if there is input or server traffic waiting.
    pub fn has_pending(&self) -> bool {
        let state = self.lock_state();
        if !state.pending_events.is_empty() || !state.inbound.is_empty() {
            return true;
        }

        let server = self.lock_server();
        state.channels.values().any(|conn| server.has_outbox(*conn) || server.is_kicked(*conn))
    }

    /// Check invariants against Bridge and App state.
    pub fn check_invariants<E: Environment>(&self, bridge: &Bridge<E>, app: &App, context: &str) {
        if let Some(ref registry) = self.invariants {
            let client = ClientSnapshot::from_client(0, bridge.client()).with_view(app);
            let snapshot = SystemSnapshot::single(client);
            registry.assert_all(&snapshot, context);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_server(&self) -> MutexGuard<'_, SimServer> {
        self.server.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move server traffic for our channels into the inbound queue.
    fn pull_from_server(&self) {
        let mut state = self.lock_state();
        let mut server = self.lock_server();
        let channels: Vec<_> = state.channels.iter().map(|(ch, conn)| (*ch, *conn)).collect();

        for (channel, conn) in channels {
            if server.is_kicked(conn) {
                server.disconnect(conn);
                state.channels.remove(&channel);
                state.inbound.push_back(ChannelInbound::Closed { channel });
                continue;
            }
            for text in server.take_outbox(conn) {
                state.inbound.push_back(ChannelInbound::Packet { channel, text });
            }
        }
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;
    type Instant = SimInstant;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        Ok(self.lock_state().pending_events.pop_front())
    }

    async fn open_channel(
        &mut self,
        channel: ChannelId,
        username: &str,
    ) -> Result<(), Self::Error> {
        let conn = self.lock_server().connect().map_err(|e| SimDriverError(e.to_string()))?;
        tracing::debug!(%channel, %conn, %username, "sim channel opened");
        self.lock_state().channels.insert(channel, conn);
        Ok(())
    }

    async fn send_event(
        &mut self,
        channel: ChannelId,
        event: OutboundEvent,
    ) -> Result<(), Self::Error> {
        let Some(conn) = self.connection(channel) else {
            tracing::debug!(%channel, event = event.name(), "dropping event for closed channel");
            return Ok(());
        };

        let text = event.clone().into_packet().encode().map_err(|e| SimDriverError(e.to_string()))?;
        self.lock_server().receive(conn, &text).map_err(|e| SimDriverError(e.to_string()))?;
        self.lock_state().sent.push((channel, event));
        Ok(())
    }

    async fn recv(&mut self) -> Option<ChannelInbound> {
        if self.lock_state().inbound.is_empty() {
            self.pull_from_server();
        }
        self.lock_state().inbound.pop_front()
    }

    async fn close_channel(&mut self, channel: ChannelId) {
        let conn = self.lock_state().channels.remove(&channel);
        if let Some(conn) = conn {
            self.lock_server().disconnect(conn);
        }
    }

    fn is_connected(&self) -> bool {
        !self.lock_state().channels.is_empty()
    }

    fn now(&self) -> Self::Instant {
        self.env.now()
    }

    fn render(&mut self, _app: &App) -> Result<(), Self::Error> {
        self.lock_state().renders += 1;
        Ok(())
    }

    async fn stop(&mut self) {
        let channels: Vec<_> = self.lock_state().channels.keys().copied().collect();
        for channel in channels {
            self.close_channel(channel).await;
        }
    }
}

//! In-process simulated server.
//!
//! Each channel opened in simulation mode becomes a connection on a shared
//! [`SimServer`](parley_harness::SimServer). A tokio task moves events between
//! mpsc channels and the server, encoding and decoding wire text on the way,
//! so the terminal client speaks the full event contract with no network.
//!
//! Replies are collected only after an event sent on the same connection.
//! Packets the server queues for a connection in response to another
//! connection wait until that connection sends something. Simulation mode
//! has a single user, so nothing is held back in practice.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::sync::PoisonError;

use parley_client::transport::CLOSE_TIMEOUT;
use parley_harness::{ConnectionId, SharedSimServer, SimServerError, create_shared_server};
use parley_proto::{HistoryEntry, OutboundEvent};
use tokio::{sync::mpsc, task::JoinHandle};

/// Capacity of both event channels.
const CHANNEL_CAPACITY: usize = 32;

/// Create the simulated world: one server with a seeded lobby room.
pub fn simulated_world() -> SharedSimServer {
    let server = create_shared_server();
    server.lock().unwrap_or_else(PoisonError::into_inner).seed_room(
        "general",
        [
            HistoryEntry::new("parley", "Welcome to the simulated server."),
            HistoryEntry::new("parley", "Messages here never leave this process."),
        ],
    );
    server
}

/// Handle to a simulated connection.
///
/// Dropping the handle aborts the connection task and releases the username.
/// Use [`close`](Self::close) to let queued events reach the server first.
pub struct ServerHandle {
    /// Send events to the server.
    pub to_server: mpsc::Sender<OutboundEvent>,
    /// Receive event packets from the server.
    pub from_server: mpsc::Receiver<String>,
    connection: ConnectionGuard,
}

impl ServerHandle {
    /// Deliver queued events, then disconnect from the server.
    pub async fn close(self) {
        let Self { to_server, from_server, mut connection } = self;
        drop(to_server);
        drop(from_server);

        if tokio::time::timeout(CLOSE_TIMEOUT, &mut connection.task).await.is_err() {
            tracing::warn!(conn = %connection.conn, "simulated connection did not drain in time");
        }
    }
}

/// Aborts the connection task and disconnects from the server when dropped.
struct ConnectionGuard {
    server: SharedSimServer,
    conn: ConnectionId,
    task: JoinHandle<()>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.task.abort();
        self.server.lock().unwrap_or_else(PoisonError::into_inner).disconnect(self.conn);
    }
}

/// Open a connection on `server` and spawn the task that serves it.
///
/// The task exits once `to_server` is closed and every queued event has been
/// handed to the server. Replies are discarded when nobody reads them.
///
/// # Errors
///
/// Returns an error if the server refuses the connection.
pub fn spawn_connection(server: &SharedSimServer) -> Result<ServerHandle, SimServerError> {
    let conn = server.lock().unwrap_or_else(PoisonError::into_inner).connect()?;

    let (client_tx, mut server_rx) = mpsc::channel::<OutboundEvent>(CHANNEL_CAPACITY);
    let (server_tx, client_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);

    let shared = server.clone();
    let task = tokio::spawn(async move {
        while let Some(event) = server_rx.recv().await {
            let replies = match exchange(&shared, conn, event) {
                Ok(replies) => replies,
                Err(e) => {
                    tracing::warn!(%conn, error = %e, "simulated server rejected packet");
                    continue;
                },
            };

            for text in replies {
                if server_tx.send(text).await.is_err() {
                    tracing::debug!(%conn, "reader gone, discarding reply");
                    break;
                }
            }
        }
    });

    Ok(ServerHandle {
        to_server: client_tx,
        from_server: client_rx,
        connection: ConnectionGuard { server: server.clone(), conn, task },
    })
}

/// Deliver one event and collect what the server queued for `conn`.
fn exchange(
    server: &SharedSimServer,
    conn: ConnectionId,
    event: OutboundEvent,
) -> Result<Vec<String>, SimServerError> {
    let text = event.into_packet().encode().map_err(SimServerError::Protocol)?;
    let mut server = server.lock().unwrap_or_else(PoisonError::into_inner);
    server.receive(conn, &text)?;
    Ok(server.take_outbox(conn))
}

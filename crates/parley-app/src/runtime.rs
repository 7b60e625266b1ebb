//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: UI state machine
//! - [`Bridge`]: Protocol bridge to Client
//! - [`Driver`]: Platform-specific I/O

use std::{ops::Sub, time::Duration};

use parley_core::env::Environment;

use crate::{App, AppAction, AppEvent, Bridge, ChannelInbound, ChannelOp, Driver};

/// Generic runtime that orchestrates App, Bridge, and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment providing the clock the client arms typing deadlines on
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    app: App,
    bridge: Bridge<E>,
}

impl<D, E> Runtime<D, E>
where
    D: Driver<Instant = E::Instant>,
    E: Environment,
    D::Instant: Sub<Output = Duration>,
{
    /// Create a new runtime with the given driver and environment.
    pub fn new(driver: D, env: E, server: String) -> Self {
        Self { driver, app: App::new(server), bridge: Bridge::new(env) }
    }

    /// Log in before the loop starts, as if the user typed `username`.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn auto_login(&mut self, username: &str) -> Result<(), D::Error> {
        let actions = self.app.login(username.to_string());
        self.process_actions(actions).await?;
        Ok(())
    }

    /// Run the main event loop.
    ///
    /// This is the core orchestration loop that:
    /// 1. Polls for input events from the driver
    /// 2. Receives packets from the server
    /// 3. Processes actions and events between App and Bridge
    /// 4. Performs queued channel operations through the driver
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        self.driver.render(&self.app)?;

        loop {
            let should_quit = self.process_cycle().await?;
            if should_quit {
                break;
            }
        }

        self.driver.stop().await;
        Ok(())
    }

    /// Process one cycle of the event loop.
    ///
    /// Returns `true` if the application should quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn process_cycle(&mut self) -> Result<bool, D::Error> {
        if let Some(event) = self.driver.poll_event().await? {
            let actions = self.app.handle(event);
            if !actions.is_empty() && self.process_actions(actions).await? {
                return Ok(true);
            }
        }

        if let Some(inbound) = self.driver.recv().await {
            let events = match inbound {
                ChannelInbound::Packet { channel, text } => {
                    self.bridge.handle_packet(channel, text)
                },
                ChannelInbound::Closed { channel } => {
                    self.driver.close_channel(channel).await;
                    self.bridge.handle_channel_closed(channel)
                },
            };
            self.flush_outgoing().await;
            if self.process_bridge_events(events).await? {
                return Ok(true);
            }
        }

        let now = self.driver.now();
        let events = self.bridge.handle_tick(now);
        self.flush_outgoing().await;
        if self.process_bridge_events(events).await? {
            return Ok(true);
        }

        Ok(false)
    }

    /// Process actions returned by the App.
    ///
    /// Returns `true` if should quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn process_actions(
        &mut self,
        initial_actions: Vec<AppAction>,
    ) -> Result<bool, D::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    AppAction::Render => self.driver.render(&self.app)?,
                    AppAction::Quit => return Ok(true),

                    // Protocol operations go through the bridge
                    AppAction::Login { .. }
                    | AppAction::JoinRoom { .. }
                    | AppAction::StartPrivateChat { .. }
                    | AppAction::SendMessage { .. }
                    | AppAction::Keystroke
                    | AppAction::Logout => {
                        let events = self.bridge.process_app_action(action);
                        for event in events {
                            let new_actions = self.app.handle(event);
                            pending_actions.extend(new_actions);
                        }
                        self.flush_outgoing().await;
                    },
                }
            }
        }
        Ok(false)
    }

    /// Process actions synchronously (for use in sync contexts).
    fn process_actions_sync(&mut self, actions: Vec<AppAction>) {
        for action in actions {
            match action {
                AppAction::Render => {
                    if let Err(e) = self.driver.render(&self.app) {
                        tracing::warn!("Failed to render: {:?}", e);
                    }
                },
                AppAction::Quit => {},

                // Protocol actions shouldn't happen in sync contexts
                AppAction::Login { .. }
                | AppAction::JoinRoom { .. }
                | AppAction::StartPrivateChat { .. }
                | AppAction::SendMessage { .. }
                | AppAction::Keystroke
                | AppAction::Logout => {
                    tracing::warn!("Unexpected protocol action in sync context: {:?}", action);
                },
            }
        }
    }

    /// Process events from Bridge back to App.
    async fn process_bridge_events(&mut self, events: Vec<AppEvent>) -> Result<bool, D::Error> {
        for event in events {
            let actions = self.app.handle(event);
            if self.process_actions(actions).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Perform queued channel operations until the bridge has none left.
    ///
    /// Channel failures are fed back to the bridge instead of aborting the
    /// loop. Whatever the bridge queues in response is drained too.
    async fn flush_outgoing(&mut self) {
        loop {
            let ops = self.bridge.take_outgoing();
            if ops.is_empty() {
                break;
            }

            for op in ops {
                let events = match op {
                    ChannelOp::Open { channel, username } => {
                        match self.driver.open_channel(channel, &username).await {
                            Ok(()) => self.bridge.handle_channel_opened(channel),
                            Err(e) => {
                                tracing::warn!(%channel, error = %e, "failed to open channel");
                                self.bridge.handle_channel_failed(channel, e.to_string())
                            },
                        }
                    },
                    ChannelOp::Send { channel, event } => {
                        match self.driver.send_event(channel, event).await {
                            Ok(()) => continue,
                            Err(e) => {
                                tracing::warn!(%channel, error = %e, "send failed");
                                self.driver.close_channel(channel).await;
                                self.bridge.handle_channel_failed(channel, e.to_string())
                            },
                        }
                    },
                    ChannelOp::Close { channel } => {
                        self.driver.close_channel(channel).await;
                        continue;
                    },
                };

                for event in events {
                    let actions = self.app.handle(event);
                    self.process_actions_sync(actions);
                }
            }
        }
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Get a reference to the Bridge
    pub fn bridge(&self) -> &Bridge<E> {
        &self.bridge
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the Driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

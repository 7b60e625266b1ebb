//! Channel lifecycle.
//!
//! One channel per identity. Every establishment mints a fresh [`ChannelId`]
//! generation; the previous channel, if any, is closed first. Events reported
//! by the driver carry the id of the channel they came from, so anything from a
//! torn-down generation can be recognised and dropped.
//!
//! ```text
//!            establish                 opened
//! ┌──────┐ ───────────> ┌─────────┐ ─────────> ┌──────┐
//! │ None │              │ Opening │            │ Open │
//! └──────┘ <─────────── └─────────┘            └──────┘
//!     ^     teardown/failed                       │
//!     └───────────────────────────────────────────┘
//!                    teardown/closed
//! ```

use std::fmt;

use parley_core::Identity;

/// Generation number of an established channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(u64);

impl ChannelId {
    /// Raw generation number.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch#{}", self.0)
    }
}

/// I/O the driver performs on behalf of the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelCommand {
    /// Open a channel bound to `identity`. Sends that follow are queued until
    /// the open completes.
    Open {
        /// New generation.
        channel: ChannelId,
        /// Identity the channel belongs to.
        identity: Identity,
    },
    /// Close a channel and release its resources.
    Close {
        /// Generation to close.
        channel: ChannelId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Live {
    id: ChannelId,
    open: bool,
}

/// Owns the single live channel generation.
#[derive(Debug, Clone, Default)]
pub struct ChannelLifecycle {
    next: u64,
    live: Option<Live>,
}

impl ChannelLifecycle {
    /// Create a lifecycle with no channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tear down any live channel, then open a new one for `identity`.
    ///
    /// Returns `[Close{old}]?` followed by `Open{new}`.
    pub fn establish(&mut self, identity: Identity) -> Vec<ChannelCommand> {
        let mut commands: Vec<ChannelCommand> = self.teardown().into_iter().collect();

        self.next += 1;
        let channel = ChannelId(self.next);
        self.live = Some(Live { id: channel, open: false });

        commands.push(ChannelCommand::Open { channel, identity });
        commands
    }

    /// Close the live channel, if any.
    pub fn teardown(&mut self) -> Option<ChannelCommand> {
        self.live.take().map(|live| ChannelCommand::Close { channel: live.id })
    }

    /// Driver reports the open completed. `false` if `channel` is stale.
    pub fn opened(&mut self, channel: ChannelId) -> bool {
        match &mut self.live {
            Some(live) if live.id == channel => {
                live.open = true;
                true
            },
            _ => false,
        }
    }

    /// Driver reports the channel is gone. `false` if `channel` is stale.
    ///
    /// Nothing needs closing afterwards; the driver already dropped it.
    pub fn lost(&mut self, channel: ChannelId) -> bool {
        if self.is_live(channel) {
            self.live = None;
            true
        } else {
            false
        }
    }

    /// Whether `channel` is the current generation.
    pub fn is_live(&self, channel: ChannelId) -> bool {
        self.live.is_some_and(|live| live.id == channel)
    }

    /// Current generation, open or still opening.
    pub fn live(&self) -> Option<ChannelId> {
        self.live.map(|live| live.id)
    }

    /// Whether the current generation finished opening.
    pub fn is_open(&self) -> bool {
        self.live.is_some_and(|live| live.open)
    }
}

//! Typing presence.
//!
//! Two independent halves share this type:
//!
//! - Local: a debounced "I am typing" broadcaster. Each keystroke emits
//!   `typing(true)` and moves a single deadline to `now + TYPING_STOP_DELAY`.
//!   The first poll at or past the deadline emits one `typing(false)` and
//!   disarms. Re-arming replaces the deadline, so a burst of keystrokes yields
//!   exactly one stop signal.
//! - Remote: the latest peer signal, latched as a single status string. No
//!   per-user bookkeeping; the last signal wins.
//!
//! Time is passed in explicitly, so the same logic runs on a virtual clock.

use std::{ops::Add, time::Duration};

use parley_proto::{OutboundEvent, TypingSignal};

/// Delay after the last keystroke before `typing(false)` is sent.
pub const TYPING_STOP_DELAY: Duration = Duration::from_millis(1000);

/// Debounced local presence plus latched remote status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingPresence<I> {
    deadline: Option<I>,
    status: String,
}

impl<I> Default for TypingPresence<I> {
    fn default() -> Self {
        Self { deadline: None, status: String::new() }
    }
}

impl<I> TypingPresence<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    /// Create a disarmed presence with an empty status.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a keystroke at `now`.
    ///
    /// Always returns `typing(true)` and (re-)arms the stop deadline. Callers
    /// decide whether keystrokes count, i.e. only inside a joined room.
    pub fn keystroke(&mut self, now: I) -> OutboundEvent {
        self.deadline = Some(now + TYPING_STOP_DELAY);
        OutboundEvent::Typing { is_typing: true }
    }

    /// Fire the deadline if it has passed.
    pub fn poll(&mut self, now: I) -> Option<OutboundEvent> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.flush(),
            _ => None,
        }
    }

    /// Emit the pending `typing(false)` immediately, if armed.
    pub fn flush(&mut self) -> Option<OutboundEvent> {
        self.deadline.take().map(|_| OutboundEvent::Typing { is_typing: false })
    }

    /// Disarm without emitting anything.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether a `typing(false)` is pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Pending deadline, if armed.
    pub fn deadline(&self) -> Option<I> {
        self.deadline
    }

    /// Latch a peer signal. Returns `true` if the status text changed.
    pub fn observe(&mut self, signal: &TypingSignal) -> bool {
        let status = if signal.is_typing {
            format!("{} is typing...", signal.username)
        } else {
            String::new()
        };

        if status == self.status {
            return false;
        }
        self.status = status;
        true
    }

    /// Current peer status text. Empty when nobody is typing.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Disarm and clear the status.
    pub fn reset(&mut self) {
        self.deadline = None;
        self.status.clear();
    }
}

//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from the system clock. Production uses
//! `std::time::Instant`; the simulation harness supplies a virtual clock that
//! only moves when a test advances it.

use std::{
    ops::{Add, Sub},
    time::Duration,
};

/// Abstract environment providing time.
///
/// # Invariants
///
/// - `now()` never goes backwards within one execution context.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    type Instant: Copy
        + Ord
        + Send
        + Sync
        + std::fmt::Debug
        + Add<Duration, Output = Self::Instant>
        + Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;
}

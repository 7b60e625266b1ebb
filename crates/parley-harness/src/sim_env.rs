//! Virtual clock for deterministic simulation.
//!
//! `SimEnv` implements [`Environment`] with time that only moves when a test
//! calls [`SimEnv::advance`]. Clones share one clock, so every client in a
//! simulated world sees the same time.

use std::{
    ops::{Add, Sub},
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use parley_core::env::Environment;

/// Point on the virtual timeline, measured from the start of the simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Time since the simulation started.
    pub fn since_start(self) -> Duration {
        self.0
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs)
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

/// Shared virtual clock.
#[derive(Debug, Clone, Default)]
pub struct SimEnv {
    now: Arc<Mutex<SimInstant>>,
}

impl SimEnv {
    /// Create a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = *now + by;
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_clock() {
        let env = SimEnv::new();
        let other = env.clone();

        env.advance(Duration::from_millis(250));

        assert_eq!(other.now().since_start(), Duration::from_millis(250));
    }

    #[test]
    fn time_only_moves_when_advanced() {
        let env = SimEnv::new();
        let start = env.now();
        assert_eq!(env.now() - start, Duration::ZERO);

        env.advance(Duration::from_secs(1));
        assert_eq!(env.now() - start, Duration::from_secs(1));
        assert_eq!(start - env.now(), Duration::ZERO);
    }
}

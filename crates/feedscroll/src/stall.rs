//! Stall detection: stop once the accumulator has not grown for a while.

use std::time::Duration;

use tokio::time::Instant;

/// Source of the current time for stall checks.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock backed by tokio's timer, so paused test time applies.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Outcome of one stall check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallStatus {
    /// The accumulator grew; the idle timer was reset.
    Grew,
    /// No growth yet, still inside the timeout.
    Unchanged { idle: Duration },
    /// No growth for at least the timeout.
    Stalled { idle: Duration },
}

/// Tracks accumulator size across iterations and decides when to stop.
#[derive(Debug)]
pub struct StallDetector<C: Clock> {
    clock: C,
    timeout: Duration,
    last_growth: Instant,
    previous_size: usize,
}

impl<C: Clock> StallDetector<C> {
    /// Start the idle timer now with a previous size of zero.
    pub fn new(clock: C, timeout: Duration) -> Self {
        let last_growth = clock.now();
        Self {
            clock,
            timeout,
            last_growth,
            previous_size: 0,
        }
    }

    /// Record the accumulator size after an iteration.
    pub fn observe(&mut self, size: usize) -> StallStatus {
        let now = self.clock.now();
        let status = if size == self.previous_size {
            let idle = now.saturating_duration_since(self.last_growth);
            if idle >= self.timeout {
                StallStatus::Stalled { idle }
            } else {
                StallStatus::Unchanged { idle }
            }
        } else {
            self.last_growth = now;
            StallStatus::Grew
        };
        self.previous_size = size;
        status
    }
}

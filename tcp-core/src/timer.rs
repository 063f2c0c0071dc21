//! Retransmission timer
//!
//! The timer never looks at a clock. Time advances only when the driver calls
//! [`RetransmissionTimer::tick`] with the elapsed duration, which keeps the
//! sender deterministic.

use std::time::Duration;

/// Retransmission timer with exponential backoff
#[derive(Debug, Clone)]
pub struct RetransmissionTimer {
    /// Current timeout
    rto: Duration,
    /// Time accumulated since the last (re)start
    elapsed: Duration,
    /// Whether the timer is running
    active: bool,
}

impl RetransmissionTimer {
    /// Create a stopped timer with the given timeout
    pub fn new(rto: Duration) -> Self {
        RetransmissionTimer {
            rto,
            elapsed: Duration::ZERO,
            active: false,
        }
    }

    /// Start the timer from zero
    pub fn start(&mut self) {
        self.active = true;
        self.elapsed = Duration::ZERO;
    }

    /// Stop the timer
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Zero the elapsed time without changing the active flag
    pub fn restart(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    /// Advance the timer. Ignored while stopped.
    pub fn tick(&mut self, elapsed: Duration) {
        if self.active {
            self.elapsed = self.elapsed.saturating_add(elapsed);
        }
    }

    /// Running and past the timeout
    pub fn is_expired(&self) -> bool {
        self.active && self.elapsed >= self.rto
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current timeout
    pub fn rto(&self) -> Duration {
        self.rto
    }

    pub fn set_rto(&mut self, rto: Duration) {
        self.rto = rto;
    }

    /// Double the timeout
    ///
    /// There is no ceiling; the value saturates at `Duration::MAX`.
    pub fn back_off(&mut self) {
        self.rto = self.rto.saturating_mul(2);
    }

    /// Time accumulated since the last (re)start
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

//! Progress publisher: a single cooperative tick that is only armed while
//! playing.
//!
//! There is exactly one pending deadline at a time; `start` replaces it and
//! `stop` clears it, so ticks can never pile up.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct ProgressPublisher {
    interval: Duration,
    next_due: Option<Instant>,
}

impl ProgressPublisher {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next_due: None,
        }
    }

    /// Arm the tick, cancelling any pending one.
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// True when a tick is due at `now`; the next one is scheduled from `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}

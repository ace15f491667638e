//! Fixed-interval trigger for re-evaluating clock/date/text content.
//!
//! The host loop owns the clock: it passes `Instant`s in, so the ticker is
//! deterministic under test.

use std::time::{Duration, Instant};

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct ContentTicker {
    interval: Duration,
    last: Option<Instant>,
}

impl Default for ContentTicker {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl ContentTicker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a refresh is due at `now`. The first call is always due.
    pub fn due(&self, now: Instant) -> bool {
        match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// Record that a refresh happened at `now`.
    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }

    /// `due` + `mark` in one step.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.due(now) {
            self.mark(now);
            true
        } else {
            false
        }
    }
}

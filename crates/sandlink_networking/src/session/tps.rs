//! Snapshots-per-second counter.

use std::time::{Duration, Instant};

/// Counts snapshots and reports once per window.
#[derive(Clone, Debug)]
pub struct TpsCounter {
    window: Duration,
    count: u32,
    last_check: Option<Instant>,
    tps: u32,
}

impl TpsCounter {
    /// Creates a counter reporting at most once per `window`.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            count: 0,
            last_check: None,
            tps: 0,
        }
    }

    /// Last reported value.
    #[inline]
    #[must_use]
    pub const fn tps(&self) -> u32 {
        self.tps
    }

    /// Records one snapshot. Returns the new rate when a window closed.
    pub fn record(&mut self, now: Instant) -> Option<u32> {
        self.count = self.count.saturating_add(1);
        let due = match self.last_check {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.window,
        };
        if !due {
            return None;
        }
        self.tps = self.count;
        self.count = 0;
        self.last_check = Some(now);
        Some(self.tps)
    }
}

//! Wall-clock budget for a backend call.
//!
//! Created before any lowering so that model construction counts against
//! the budget. The lowering and posting loops call [`Deadline::step`] per
//! constraint; the clock is read only when the step counter hits the check
//! mask.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub(crate) struct Deadline {
    start: Instant,
    limit: Duration,
    steps: u64,
    clock_check_mask: u64,
    expired: bool,
}

impl Deadline {
    /// Check every 64 steps.
    const DEFAULT_CLOCK_CHECK_MASK: u64 = 0x3F;

    pub fn new(limit: Duration) -> Self {
        Self::with_clock_check_mask(limit, Self::DEFAULT_CLOCK_CHECK_MASK)
    }

    pub fn with_clock_check_mask(limit: Duration, clock_check_mask: u64) -> Self {
        Self {
            start: Instant::now(),
            limit,
            steps: 0,
            clock_check_mask,
            expired: false,
        }
    }

    /// Counts one search step; `true` once the budget is spent.
    ///
    /// The first step always reads the clock.
    #[inline]
    pub fn step(&mut self) -> bool {
        if !self.expired && (self.steps & self.clock_check_mask) == 0 {
            self.expired = self.start.elapsed() >= self.limit;
        }
        self.steps = self.steps.wrapping_add(1);
        self.expired
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Budget left for the underlying engine.
    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.start.elapsed())
    }

    /// Reads the clock now, ignoring the mask.
    pub fn is_spent(&self) -> bool {
        self.expired || self.start.elapsed() >= self.limit
    }
}

//! Revision clock
//!
//! Snapshots and confirmed local writes are stamped from one shared counter,
//! so the controller can tell whether a snapshot's fetch started before or
//! after its last confirmed write.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter; every tick is strictly greater than the last
#[derive(Debug, Default)]
pub struct RevisionClock {
    current: AtomicU64,
}

impl RevisionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock and returns the new revision
    pub fn tick(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Latest issued revision (0 before the first tick)
    pub fn now(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }
}

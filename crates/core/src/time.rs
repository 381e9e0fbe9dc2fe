//! Injectable clock.
//!
//! All lockout and session arithmetic goes through [`Clock`] so tests can
//! drive transitions deterministically instead of sleeping on wall-clock
//! timers. Production wires in [`SystemClock`]; tests use [`ManualClock`].

use std::sync::atomic::{AtomicI64, Ordering};

use crate::types::EpochMs;

/// Source of "now" in UTC epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> EpochMs;
}

/// Wall-clock time via chrono.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> EpochMs {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Manually advanced clock for tests.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: EpochMs) -> Self {
        Self {
            now: AtomicI64::new(start_ms),
        }
    }

    /// Move time forward by `ms` milliseconds.
    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump to an absolute instant.
    pub fn set(&self, now_ms: EpochMs) {
        self.now.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> EpochMs {
        self.now.load(Ordering::SeqCst)
    }
}

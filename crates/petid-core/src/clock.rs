//! # Clock Abstraction
//!
//! Time-dependent rules (vaccine currency, minimum transfer age, record
//! timestamps) read time through an injected [`Clock`] rather than calling
//! `Utc::now()` directly, so tests can move time forward deterministically.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::temporal::Timestamp;

/// Source of the current time.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current UTC time, seconds precision.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time. The production default.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: Timestamp,
}

impl FixedClock {
    /// Create a clock that always reports `at`.
    pub const fn new(at: Timestamp) -> Self {
        Self { at }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.at
    }
}

/// A clock that only moves when told to.
///
/// Shareable behind an `Arc`: advancing it is visible to every holder.
#[derive(Debug)]
pub struct ManualClock {
    epoch_secs: AtomicI64,
}

impl ManualClock {
    /// Start the clock at `at`.
    pub fn new(at: Timestamp) -> Self {
        Self {
            epoch_secs: AtomicI64::new(at.epoch_secs()),
        }
    }

    /// Move the clock forward (or backward, for negative values) by `secs`.
    pub fn advance_secs(&self, secs: i64) {
        self.epoch_secs.fetch_add(secs, Ordering::SeqCst);
    }

    /// Move the clock forward by whole ledger days.
    pub fn advance_days(&self, days: u32) {
        self.advance_secs(i64::from(days) * crate::temporal::SECONDS_PER_DAY);
    }

    /// Jump to an absolute instant.
    pub fn set(&self, at: Timestamp) {
        self.epoch_secs.store(at.epoch_secs(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        let secs = self.epoch_secs.load(Ordering::SeqCst);
        // Only reachable after advancing past chrono's range.
        Timestamp::from_epoch_secs(secs).unwrap_or_else(|_| Timestamp::now())
    }
}

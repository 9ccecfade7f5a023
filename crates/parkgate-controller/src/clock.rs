//! Wall-clock time for timestamps.
//!
//! Scheduling always runs on the monotonic [`std::time::Instant`] passed to
//! each tick. Wall-clock time is only used to stamp slot records and telemetry,
//! and may be unknown (no time sync yet), in which case timestamps are omitted.

use std::sync::Arc;

use chrono::{Duration, Local, NaiveDateTime};
use parking_lot::Mutex;

pub trait WallClock: Send {
    /// Current local time, or `None` if the clock is not synchronized.
    fn now(&self) -> Option<NaiveDateTime>;
}

/// The host's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> Option<NaiveDateTime> {
        Some(Local::now().naive_local())
    }
}

/// A clock that never synchronized.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsyncedClock;

impl WallClock for UnsyncedClock {
    fn now(&self) -> Option<NaiveDateTime> {
        None
    }
}

/// A clock set by hand; clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Option<NaiveDateTime>>>,
}

impl ManualClock {
    pub fn new(now: Option<NaiveDateTime>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: Option<NaiveDateTime>) {
        *self.now.lock() = now;
    }

    /// Move the clock forward; an unsynchronized clock stays unsynchronized.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = now.map(|at| at + by);
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> Option<NaiveDateTime> {
        *self.now.lock()
    }
}

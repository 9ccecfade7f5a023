//! Non-blocking interval and timeout primitive.
//!
//! A [`Timer`] never sleeps. It records a deadline on [`Timer::start`] and
//! reports, through [`Timer::update`], the first call made at or after that
//! deadline. The current time is always passed in by the caller, so the same
//! code runs against [`Instant::now`] in production and against a synthetic
//! clock in tests.
//!
//! # Modes
//!
//! - [`TimerMode::OneShot`]: fires once, then stays stopped until the next
//!   `start`.
//! - [`TimerMode::Periodic`]: fires once per elapsed interval and re-arms by
//!   advancing its deadline by exactly one interval, so the period does not
//!   drift with tick jitter.
//!
//! # Examples
//!
//! ```
//! use parkgate_core::Timer;
//! use std::time::{Duration, Instant};
//!
//! let t0 = Instant::now();
//! let mut timeout = Timer::one_shot(Duration::from_millis(500));
//! timeout.start(t0);
//!
//! assert!(!timeout.update(t0 + Duration::from_millis(499)));
//! assert!(timeout.update(t0 + Duration::from_millis(500)));
//! // Edge-triggered: the elapse is reported once.
//! assert!(!timeout.update(t0 + Duration::from_millis(900)));
//! assert!(!timeout.is_running());
//! ```

use std::time::{Duration, Instant};

/// Re-arm behaviour of a [`Timer`] after it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// Stop after firing; a fresh `start` is required.
    OneShot,
    /// Advance the deadline by one interval after firing.
    Periodic,
}

#[derive(Debug, Clone)]
pub struct Timer {
    interval: Duration,
    deadline: Option<Instant>,
    mode: TimerMode,
}

impl Timer {
    /// Create a stopped timer with the given interval and mode.
    pub fn new(interval: Duration, mode: TimerMode) -> Self {
        Self {
            interval,
            deadline: None,
            mode,
        }
    }

    /// Create a stopped one-shot timer.
    pub fn one_shot(interval: Duration) -> Self {
        Self::new(interval, TimerMode::OneShot)
    }

    /// Create a stopped periodic timer.
    pub fn periodic(interval: Duration) -> Self {
        Self::new(interval, TimerMode::Periodic)
    }

    /// Arm the timer: the deadline becomes `now + interval`.
    ///
    /// Starting a running timer restarts it from `now`.
    pub fn start(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
    }

    /// Disarm the timer without firing.
    pub fn stop(&mut self) {
        self.deadline = None;
    }

    /// Report whether the deadline has been reached since the last report.
    ///
    /// Returns `true` exactly once per elapse. A one-shot timer stops after
    /// reporting; a periodic timer moves its deadline forward by one interval.
    /// A stopped timer always returns `false`.
    pub fn update(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.deadline else {
            return false;
        };
        if now < deadline {
            return false;
        }

        self.deadline = match self.mode {
            TimerMode::OneShot => None,
            TimerMode::Periodic => Some(deadline + self.interval),
        };
        true
    }

    /// Change the interval used by subsequent calls to [`Timer::start`].
    ///
    /// The deadline of a running timer is left untouched.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left before the timer fires, or `None` when stopped.
    ///
    /// Returns `Some(Duration::ZERO)` for a running timer whose deadline has
    /// passed but not yet been reported by [`Timer::update`].
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}

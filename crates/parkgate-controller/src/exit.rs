//! Exit barrier sequencer.
//!
//! A vacated slot means a car is heading out. The sequencer waits the exit
//! raise delay, raises the exit barrier, holds it for the exit lower delay and
//! lowers it again, then waits for the servo to settle before accepting a new
//! trigger.
//!
//! ```text
//! Idle --trigger--> RaisePending --raise delay--> RaisedHold
//!   ^                                                 |
//!   |                                            lower delay
//!   +------ settle ------ LoweringWait <--------------+
//! ```
//!
//! Triggers only arm the sequence from `Idle`; a vacate edge during a running
//! sequence is dropped so the barrier is never raised twice or lowered early.
//! Both delays are read from the [`ParameterSet`] when their timer is armed.

use std::fmt;
use std::time::{Duration, Instant};

use parkgate_core::{Parameter, ParameterSet, Timer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Phase of the exit barrier.
///
/// `RaisePending` is the raise delay after a vacate edge. `RaisedHold` is the
/// exit lower delay with the barrier up. `LoweringWait` follows the lower
/// command and only waits for the servo to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitPhase {
    Idle,
    RaisePending,
    RaisedHold,
    LoweringWait,
}

impl fmt::Display for ExitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase_str = match self {
            ExitPhase::Idle => "Idle",
            ExitPhase::RaisePending => "RaisePending",
            ExitPhase::RaisedHold => "RaisedHold",
            ExitPhase::LoweringWait => "LoweringWait",
        };
        write!(f, "{}", phase_str)
    }
}

/// Actuator commands requested by the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitAction {
    Raise,
    Lower,
}

#[derive(Debug, Clone)]
pub struct ExitSequencer {
    phase: ExitPhase,
    raised: bool,
    raise_delay: Timer,
    hold: Timer,
    settle: Timer,
}

impl ExitSequencer {
    /// Create an idle sequencer.
    ///
    /// `servo_settle` is the time the servo needs to complete a movement.
    pub fn new(servo_settle: Duration) -> Self {
        Self {
            phase: ExitPhase::Idle,
            raised: false,
            raise_delay: Timer::one_shot(Duration::ZERO),
            hold: Timer::one_shot(Duration::ZERO),
            settle: Timer::one_shot(servo_settle),
        }
    }

    pub fn phase(&self) -> ExitPhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == ExitPhase::Idle
    }

    pub fn is_raised(&self) -> bool {
        self.raised
    }

    /// Arm the sequence for a vacated slot.
    ///
    /// Returns `true` if the sequence was armed, `false` if one is already
    /// running.
    pub fn trigger(&mut self, now: Instant, params: &ParameterSet) -> bool {
        if self.phase != ExitPhase::Idle {
            debug!(phase = %self.phase, "Exit sequence already running, trigger dropped");
            return false;
        }

        self.raise_delay
            .set_interval(params.duration(Parameter::ExitRaiseDelay));
        self.raise_delay.start(now);
        self.set_phase(ExitPhase::RaisePending);
        true
    }

    /// Advance the sequence.
    ///
    /// At most one action is produced per tick, so a zero lower delay still
    /// raises on one tick and lowers on the next.
    pub fn on_tick(&mut self, now: Instant, params: &ParameterSet) -> Option<ExitAction> {
        match self.phase {
            ExitPhase::Idle => None,
            ExitPhase::RaisePending => {
                if !self.raise_delay.update(now) {
                    return None;
                }
                self.raised = true;
                self.hold
                    .set_interval(params.duration(Parameter::ExitLowerDelay));
                self.hold.start(now);
                self.set_phase(ExitPhase::RaisedHold);
                Some(ExitAction::Raise)
            }
            ExitPhase::RaisedHold => {
                if !self.hold.update(now) {
                    return None;
                }
                self.raised = false;
                self.settle.start(now);
                self.set_phase(ExitPhase::LoweringWait);
                Some(ExitAction::Lower)
            }
            ExitPhase::LoweringWait => {
                if self.settle.update(now) {
                    self.set_phase(ExitPhase::Idle);
                }
                None
            }
        }
    }

    fn set_phase(&mut self, to: ExitPhase) {
        info!(from = %self.phase, %to, "Exit barrier transition");
        self.phase = to;
    }
}

//! Entry barrier state machine.
//!
//! This module drives the entry barrier from a granted badge to the barrier
//! being down again, using ultrasonic samples taken under the barrier to tell
//! an actual vehicle transit apart from a badge with no car behind it.
//!
//! # Phases
//!
//! - `Idle`: barrier down, waiting for a granted badge.
//! - `AwaitingCar`: barrier up, sampling the sensor until the car has passed
//!   or the no-car timeout elapses.
//! - `Passing`: the car cleared the sensor (or never came); waiting the
//!   lower-delay before closing.
//! - `LoweringWait`: barrier commanded down; waiting for the servo to settle.
//!
//! # Valid Transitions
//!
//! - Idle → AwaitingCar (badge granted)
//! - AwaitingCar → Passing (car cleared the sensor, or no-car timeout)
//! - Passing → LoweringWait (lower-delay elapsed, barrier lowered)
//! - LoweringWait → Idle (servo settled)
//!
//! # No-car timeout policy
//!
//! The timeout is armed when the barrier rises and re-armed, with the current
//! parameter value, on every sample that sees a car. Samples that see no car
//! or that are unusable never touch it. A timeout with no car ever detected
//! surfaces as [`PassOutcome::NotDetected`]; a timeout after a detection (the
//! car sat under the barrier and the sensor then lost it) counts as a pass.
//!
//! # Examples
//!
//! ```
//! use parkgate_controller::{DistanceSample, EntryAction, EntryBarrier, EntryPhase, PassOutcome};
//! use parkgate_core::ParameterSet;
//! use std::time::{Duration, Instant};
//!
//! let params = ParameterSet::default();
//! let mut entry = EntryBarrier::new(Duration::from_millis(100), Duration::from_millis(500));
//! let t0 = Instant::now();
//!
//! assert_eq!(entry.grant(t0, &params), Some(EntryAction::Raise));
//!
//! // Car under the barrier, then gone.
//! entry.on_tick(t0 + Duration::from_millis(100), Some(DistanceSample::Valid(12.0)), &params);
//! entry.on_tick(t0 + Duration::from_millis(200), Some(DistanceSample::Valid(150.0)), &params);
//! assert_eq!(entry.phase(), EntryPhase::Passing);
//!
//! // Lower-delay (3 s by default) elapses.
//! let actions = entry.on_tick(t0 + Duration::from_millis(3200), None, &params);
//! assert_eq!(actions, vec![EntryAction::Lower(PassOutcome::Detected)]);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use parkgate_core::{Parameter, ParameterSet, Timer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::sensor::DistanceSample;

/// Maximum number of phase transitions kept for diagnostics.
///
/// A full entry cycle is four transitions, so this covers the last 25 cars.
const MAX_HISTORY_SIZE: usize = 100;

/// Phase of the entry barrier.
///
/// `Passing` covers the lower-wait delay once the car has cleared the beam or
/// the no-car timeout fired. `LoweringWait` follows the lower command and
/// only waits for the servo to settle; the lane is not idle until it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPhase {
    Idle,
    AwaitingCar,
    Passing,
    LoweringWait,
}

impl fmt::Display for EntryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase_str = match self {
            EntryPhase::Idle => "Idle",
            EntryPhase::AwaitingCar => "AwaitingCar",
            EntryPhase::Passing => "Passing",
            EntryPhase::LoweringWait => "LoweringWait",
        };
        write!(f, "{}", phase_str)
    }
}

impl EntryPhase {
    /// Check if transition to `target` is valid from this phase.
    ///
    /// # Examples
    ///
    /// ```
    /// use parkgate_controller::EntryPhase;
    ///
    /// assert!(EntryPhase::Idle.can_transition_to(&EntryPhase::AwaitingCar));
    /// assert!(!EntryPhase::Idle.can_transition_to(&EntryPhase::Passing));
    /// ```
    pub fn can_transition_to(&self, target: &EntryPhase) -> bool {
        matches!(
            (self, target),
            (EntryPhase::Idle, EntryPhase::AwaitingCar)
                | (EntryPhase::AwaitingCar, EntryPhase::Passing)
                | (EntryPhase::Passing, EntryPhase::LoweringWait)
                | (EntryPhase::LoweringWait, EntryPhase::Idle)
        )
    }
}

/// How the lane was cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassOutcome {
    /// A car was seen arriving under the barrier.
    Detected,
    /// The no-car timeout elapsed without any car being seen.
    NotDetected,
}

/// Side effects requested by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryAction {
    /// Raise the barrier.
    Raise,
    /// A car started blocking the sensor.
    CarDetected,
    /// The car cleared the sensor after being detected.
    CarCleared,
    /// The no-car timeout elapsed in `AwaitingCar`.
    NoCarTimeout(PassOutcome),
    /// Lower the barrier; the lane was cleared as described.
    Lower(PassOutcome),
    /// The barrier is down and the lane accepts the next badge.
    Ready,
}

/// A recorded phase transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: EntryPhase,
    pub to: EntryPhase,
    pub at: Instant,
}

/// State machine for the entry barrier.
///
/// The machine never touches hardware: it consumes the time and the latest
/// distance sample and returns the actions to perform.
#[derive(Debug, Clone)]
pub struct EntryBarrier {
    phase: EntryPhase,
    raised: bool,
    /// The sensor currently sees a car.
    car_present: bool,
    /// A car has been seen since the barrier rose.
    detected: bool,
    outcome: PassOutcome,
    no_car: Timer,
    sample: Timer,
    lower_wait: Timer,
    settle: Timer,
    history: VecDeque<PhaseTransition>,
}

impl EntryBarrier {
    /// Create an idle machine.
    ///
    /// # Arguments
    ///
    /// * `poll_interval` - Minimum time between two ultrasonic samples
    /// * `servo_settle` - Time the servo needs to complete a movement
    pub fn new(poll_interval: Duration, servo_settle: Duration) -> Self {
        Self {
            phase: EntryPhase::Idle,
            raised: false,
            car_present: false,
            detected: false,
            outcome: PassOutcome::NotDetected,
            no_car: Timer::one_shot(Duration::ZERO),
            sample: Timer::periodic(poll_interval),
            lower_wait: Timer::one_shot(Duration::ZERO),
            settle: Timer::one_shot(servo_settle),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn phase(&self) -> EntryPhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == EntryPhase::Idle
    }

    pub fn is_raised(&self) -> bool {
        self.raised
    }

    /// Whether a car has been seen since the barrier last rose.
    pub fn car_detected(&self) -> bool {
        self.detected
    }

    /// Recent phase transitions, oldest first.
    pub fn history(&self) -> &VecDeque<PhaseTransition> {
        &self.history
    }

    /// Time left before the no-car timeout fires, when armed.
    pub fn no_car_remaining(&self, now: Instant) -> Option<Duration> {
        self.no_car.remaining(now)
    }

    /// Open the lane for a granted badge.
    ///
    /// Returns [`EntryAction::Raise`] when the machine was idle, `None`
    /// otherwise; a busy lane is left untouched.
    pub fn grant(&mut self, now: Instant, params: &ParameterSet) -> Option<EntryAction> {
        if self.phase != EntryPhase::Idle {
            warn!(phase = %self.phase, "Grant ignored, entry lane busy");
            return None;
        }

        self.raised = true;
        self.car_present = false;
        self.detected = false;
        self.outcome = PassOutcome::NotDetected;
        self.arm_no_car(now, params);
        self.sample.start(now);
        self.transition(EntryPhase::AwaitingCar, now);
        Some(EntryAction::Raise)
    }

    /// Whether the sensor should be sampled on this tick.
    ///
    /// Only true while awaiting a car, at most once per polling interval.
    pub fn sample_due(&mut self, now: Instant) -> bool {
        self.phase == EntryPhase::AwaitingCar && self.sample.update(now)
    }

    /// Advance the machine.
    ///
    /// `sample` is the reading taken on this tick, if [`Self::sample_due`]
    /// asked for one. Returns the actions to perform, in order.
    pub fn on_tick(
        &mut self,
        now: Instant,
        sample: Option<DistanceSample>,
        params: &ParameterSet,
    ) -> Vec<EntryAction> {
        let mut actions = Vec::new();

        match self.phase {
            EntryPhase::Idle => {}
            EntryPhase::AwaitingCar => {
                if let Some(sample) = sample {
                    self.on_sample(now, sample, params, &mut actions);
                }
                if self.phase == EntryPhase::AwaitingCar && self.no_car.update(now) {
                    let outcome = if self.detected {
                        PassOutcome::Detected
                    } else {
                        PassOutcome::NotDetected
                    };
                    info!(?outcome, "No-car timeout elapsed");
                    actions.push(EntryAction::NoCarTimeout(outcome));
                    self.begin_passing(now, outcome, params);
                }
            }
            EntryPhase::Passing => {
                if self.lower_wait.update(now) {
                    self.raised = false;
                    self.settle.start(now);
                    self.transition(EntryPhase::LoweringWait, now);
                    actions.push(EntryAction::Lower(self.outcome));
                }
            }
            EntryPhase::LoweringWait => {
                if self.settle.update(now) {
                    self.transition(EntryPhase::Idle, now);
                    actions.push(EntryAction::Ready);
                }
            }
        }

        actions
    }

    /// Drop any in-flight sequence and report the barrier down.
    ///
    /// Returns [`EntryAction::Lower`] if the barrier was up.
    pub fn reset(&mut self, now: Instant) -> Option<EntryAction> {
        let was_raised = self.raised;
        self.raised = false;
        self.car_present = false;
        self.no_car.stop();
        self.sample.stop();
        self.lower_wait.stop();
        self.settle.stop();
        if self.phase != EntryPhase::Idle {
            let from = self.phase;
            self.phase = EntryPhase::Idle;
            self.record(from, EntryPhase::Idle, now);
        }
        was_raised.then_some(EntryAction::Lower(self.outcome))
    }

    fn on_sample(
        &mut self,
        now: Instant,
        sample: DistanceSample,
        params: &ParameterSet,
        actions: &mut Vec<EntryAction>,
    ) {
        let Some(present) = sample.car_present(params.threshold_cm()) else {
            warn!(?sample, "Discarding unusable distance sample");
            return;
        };
        debug!(?sample, present, detected = self.detected, "Distance sample");

        if present {
            if !self.car_present {
                self.car_present = true;
                self.detected = true;
                actions.push(EntryAction::CarDetected);
            }
            self.arm_no_car(now, params);
        } else if self.car_present && self.detected {
            self.car_present = false;
            actions.push(EntryAction::CarCleared);
            self.begin_passing(now, PassOutcome::Detected, params);
        }
    }

    fn begin_passing(&mut self, now: Instant, outcome: PassOutcome, params: &ParameterSet) {
        self.outcome = outcome;
        self.no_car.stop();
        self.sample.stop();
        self.lower_wait
            .set_interval(params.duration(Parameter::LowerWait));
        self.lower_wait.start(now);
        self.transition(EntryPhase::Passing, now);
    }

    fn arm_no_car(&mut self, now: Instant, params: &ParameterSet) {
        self.no_car
            .set_interval(params.duration(Parameter::NoCarTimeout));
        self.no_car.start(now);
    }

    fn transition(&mut self, to: EntryPhase, now: Instant) {
        debug_assert!(
            self.phase.can_transition_to(&to),
            "invalid entry transition {} -> {}",
            self.phase,
            to
        );
        let from = self.phase;
        self.phase = to;
        self.record(from, to, now);
        info!(%from, %to, "Entry barrier transition");
    }

    fn record(&mut self, from: EntryPhase, to: EntryPhase, at: Instant) {
        if self.history.len() == MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(PhaseTransition { from, to, at });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLL: Duration = Duration::from_millis(100);
    const SETTLE: Duration = Duration::from_millis(500);

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn machine() -> EntryBarrier {
        EntryBarrier::new(POLL, SETTLE)
    }

    fn params() -> ParameterSet {
        ParameterSet::default()
    }

    #[test]
    fn test_new_machine_is_idle_and_lowered() {
        let entry = machine();
        assert_eq!(entry.phase(), EntryPhase::Idle);
        assert!(!entry.is_raised());
        assert!(entry.history().is_empty());
    }

    #[test]
    fn test_grant_raises_and_awaits_car() {
        let mut entry = machine();
        let t0 = Instant::now();

        assert_eq!(entry.grant(t0, &params()), Some(EntryAction::Raise));
        assert_eq!(entry.phase(), EntryPhase::AwaitingCar);
        assert!(entry.is_raised());
        assert_eq!(entry.no_car_remaining(t0), Some(ms(5000)));
    }

    #[test]
    fn test_grant_while_busy_is_refused() {
        let mut entry = machine();
        let t0 = Instant::now();
        entry.grant(t0, &params());

        assert_eq!(entry.grant(t0 + ms(10), &params()), None);
        assert_eq!(entry.history().len(), 1);
    }

    #[test]
    fn test_sampling_is_rate_limited() {
        let mut entry = machine();
        let t0 = Instant::now();
        assert!(!entry.sample_due(t0));

        entry.grant(t0, &params());
        assert!(!entry.sample_due(t0 + ms(50)));
        assert!(entry.sample_due(t0 + ms(100)));
        assert!(!entry.sample_due(t0 + ms(150)));
        assert!(entry.sample_due(t0 + ms(200)));
    }

    #[test]
    fn test_detection_path_full_cycle() {
        let mut entry = machine();
        let p = params();
        let t0 = Instant::now();
        entry.grant(t0, &p);

        let actions = entry.on_tick(t0 + ms(100), Some(DistanceSample::Valid(10.0)), &p);
        assert_eq!(actions, vec![EntryAction::CarDetected]);
        assert!(entry.car_detected());

        let actions = entry.on_tick(t0 + ms(200), Some(DistanceSample::Valid(200.0)), &p);
        assert_eq!(actions, vec![EntryAction::CarCleared]);
        assert_eq!(entry.phase(), EntryPhase::Passing);
        assert!(entry.is_raised());

        assert!(entry.on_tick(t0 + ms(3199), None, &p).is_empty());
        let actions = entry.on_tick(t0 + ms(3200), None, &p);
        assert_eq!(actions, vec![EntryAction::Lower(PassOutcome::Detected)]);
        assert!(!entry.is_raised());
        assert_eq!(entry.phase(), EntryPhase::LoweringWait);

        let actions = entry.on_tick(t0 + ms(3700), None, &p);
        assert_eq!(actions, vec![EntryAction::Ready]);
        assert!(entry.is_idle());

        let phases: Vec<_> = entry.history().iter().map(|t| t.to).collect();
        assert_eq!(
            phases,
            vec![
                EntryPhase::AwaitingCar,
                EntryPhase::Passing,
                EntryPhase::LoweringWait,
                EntryPhase::Idle
            ]
        );
    }

    #[test]
    fn test_timeout_path_without_detection() {
        let mut entry = machine();
        let p = params();
        let t0 = Instant::now();
        entry.grant(t0, &p);

        entry.on_tick(t0 + ms(100), Some(DistanceSample::Valid(250.0)), &p);
        assert!(entry.on_tick(t0 + ms(4999), None, &p).is_empty());

        let actions = entry.on_tick(t0 + ms(5000), None, &p);
        assert_eq!(
            actions,
            vec![EntryAction::NoCarTimeout(PassOutcome::NotDetected)]
        );
        assert_eq!(entry.phase(), EntryPhase::Passing);

        let actions = entry.on_tick(t0 + ms(8000), None, &p);
        assert_eq!(actions, vec![EntryAction::Lower(PassOutcome::NotDetected)]);
    }

    #[test]
    fn test_detection_restarts_no_car_timeout() {
        let mut entry = machine();
        let p = params();
        let t0 = Instant::now();
        entry.grant(t0, &p);

        entry.on_tick(t0 + ms(4000), Some(DistanceSample::Valid(10.0)), &p);
        assert_eq!(entry.no_car_remaining(t0 + ms(4000)), Some(ms(5000)));

        // Continued presence keeps re-arming it.
        entry.on_tick(t0 + ms(8000), Some(DistanceSample::Valid(12.0)), &p);
        assert!(entry.on_tick(t0 + ms(12_999), None, &p).is_empty());
        assert_eq!(entry.phase(), EntryPhase::AwaitingCar);
    }

    #[test]
    fn test_absent_samples_do_not_restart_timeout() {
        let mut entry = machine();
        let p = params();
        let t0 = Instant::now();
        entry.grant(t0, &p);

        entry.on_tick(t0 + ms(4000), Some(DistanceSample::Valid(300.0)), &p);
        assert_eq!(entry.no_car_remaining(t0 + ms(4000)), Some(ms(1000)));
    }

    #[test]
    fn test_invalid_sample_retains_state() {
        let mut entry = machine();
        let p = params();
        let t0 = Instant::now();
        entry.grant(t0, &p);
        entry.on_tick(t0 + ms(100), Some(DistanceSample::Valid(10.0)), &p);

        let actions = entry.on_tick(t0 + ms(200), Some(DistanceSample::OutOfRange(0.5)), &p);
        assert!(actions.is_empty());
        let actions = entry.on_tick(t0 + ms(300), Some(DistanceSample::NoEcho), &p);
        assert!(actions.is_empty());
        assert_eq!(entry.phase(), EntryPhase::AwaitingCar);

        let actions = entry.on_tick(t0 + ms(400), Some(DistanceSample::Valid(100.0)), &p);
        assert_eq!(actions, vec![EntryAction::CarCleared]);
    }

    #[test]
    fn test_timeout_after_detection_counts_as_pass() {
        let mut entry = machine();
        let p = params();
        let t0 = Instant::now();
        entry.grant(t0, &p);
        entry.on_tick(t0 + ms(100), Some(DistanceSample::Valid(10.0)), &p);

        let actions = entry.on_tick(t0 + ms(5100), Some(DistanceSample::NoEcho), &p);
        assert_eq!(actions, vec![EntryAction::NoCarTimeout(PassOutcome::Detected)]);
    }

    #[test]
    fn test_threshold_parameter_applies_to_next_sample() {
        let mut entry = machine();
        let mut p = params();
        let t0 = Instant::now();
        entry.grant(t0, &p);

        p.set(Parameter::UltrasonicThreshold, 5).unwrap();
        let actions = entry.on_tick(t0 + ms(100), Some(DistanceSample::Valid(10.0)), &p);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_timeout_change_applies_on_next_arm_only() {
        let mut entry = machine();
        let mut p = params();
        let t0 = Instant::now();
        entry.grant(t0, &p);

        p.set(Parameter::NoCarTimeout, 1000).unwrap();
        assert!(entry.on_tick(t0 + ms(1000), None, &p).is_empty());
        assert_eq!(entry.no_car_remaining(t0 + ms(1000)), Some(ms(4000)));

        entry.on_tick(t0 + ms(1100), Some(DistanceSample::Valid(10.0)), &p);
        assert_eq!(entry.no_car_remaining(t0 + ms(1100)), Some(ms(1000)));
    }

    #[test]
    fn test_reset_lowers_raised_barrier() {
        let mut entry = machine();
        let t0 = Instant::now();
        entry.grant(t0, &params());

        assert_eq!(
            entry.reset(t0 + ms(10)),
            Some(EntryAction::Lower(PassOutcome::NotDetected))
        );
        assert!(entry.is_idle());
        assert!(!entry.is_raised());
        assert_eq!(entry.reset(t0 + ms(20)), None);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut entry = machine();
        let p = params();
        let mut now = Instant::now();

        for _ in 0..40 {
            entry.grant(now, &p);
            now += ms(5000);
            entry.on_tick(now, None, &p);
            now += ms(3000);
            entry.on_tick(now, None, &p);
            now += ms(500);
            entry.on_tick(now, None, &p);
            assert!(entry.is_idle());
        }

        assert_eq!(entry.history().len(), MAX_HISTORY_SIZE);
    }

    #[test]
    fn test_phase_display_formatting() {
        assert_eq!(EntryPhase::Idle.to_string(), "Idle");
        assert_eq!(EntryPhase::AwaitingCar.to_string(), "AwaitingCar");
        assert_eq!(EntryPhase::Passing.to_string(), "Passing");
        assert_eq!(EntryPhase::LoweringWait.to_string(), "LoweringWait");
    }
}

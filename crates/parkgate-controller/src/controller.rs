//! The cooperative scheduler tying every component together.
//!
//! [`ParkingController::tick`] is called in a tight loop with the current
//! monotonic time. A tick never blocks (the only bounded wait is the
//! ultrasonic echo, taken at most once per polling interval while the entry
//! barrier waits for a car) and runs the components in a fixed order:
//!
//! 1. Poll the badge reader and decide on any badge presented.
//! 2. Sample the distance sensor, if the entry barrier asks for it.
//! 3. Advance the entry barrier and the exit sequencer.
//! 4. Expire the transient display message.
//! 5. Read the slot switches and apply occupancy edges.
//! 6. Publish the periodic sensor reading.
//! 7. Push the display frame if it changed.
//!
//! Device faults during a tick are logged and skipped; the loop never stops.

use std::time::Instant;

use chrono::NaiveDateTime;
use parkgate_core::telemetry::BarrierAction;
use parkgate_core::{
    BadgeId, BarrierKind, ControllerConfig, Parameter, ParameterSet, TelemetryEvent, Timer,
};
use tracing::{debug, info, warn};

use crate::access::{AccessController, AuthorizedBadgeSet, Decision};
use crate::clock::{SystemClock, WallClock};
use crate::display::{DisplayScheduler, Message};
use crate::entry::{EntryAction, EntryBarrier, PassOutcome};
use crate::error::{ControllerError, Result};
use crate::exit::{ExitAction, ExitSequencer};
use crate::occupancy::Occupancy;
use crate::peripherals::Peripherals;
use crate::sensor::DistanceSample;
use crate::slots::{SlotEvent, SlotTracker};
use crate::status::{SlotStatus, StatusReport};
use crate::store::{MemoryStore, ParameterStore};
use crate::telemetry::{NullSink, TelemetrySink};

/// Result of a parameter change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterChange {
    pub parameter: Parameter,
    pub old: u32,
    pub new: u32,
    /// Whether the parameter store accepted the new set.
    pub persisted: bool,
}

/// Builder for [`ParkingController`].
///
/// # Examples
///
/// ```
/// use parkgate_controller::{ParkingController, Peripherals};
/// use parkgate_core::ControllerConfig;
/// use std::time::Instant;
///
/// let (peripherals, handles) = Peripherals::mock(2);
/// let controller = ParkingController::builder()
///     .with_config(ControllerConfig::default())
///     .with_peripherals(peripherals)
///     .build(Instant::now())
///     .unwrap();
///
/// assert_eq!(controller.occupancy().available(), 2);
/// assert_eq!(handles.entry_servo.angle(), Some(0));
/// ```
pub struct ParkingControllerBuilder {
    config: ControllerConfig,
    peripherals: Option<Peripherals>,
    store: Box<dyn ParameterStore>,
    sink: Box<dyn TelemetrySink>,
    clock: Box<dyn WallClock>,
}

impl Default for ParkingControllerBuilder {
    fn default() -> Self {
        Self {
            config: ControllerConfig::default(),
            peripherals: None,
            store: Box::new(MemoryStore::new()),
            sink: Box::new(NullSink),
            clock: Box::new(SystemClock),
        }
    }
}

impl ParkingControllerBuilder {
    pub fn with_config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_peripherals(mut self, peripherals: Peripherals) -> Self {
        self.peripherals = Some(peripherals);
        self
    }

    pub fn with_store(mut self, store: impl ParameterStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn with_sink(mut self, sink: impl TelemetrySink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn with_clock(mut self, clock: impl WallClock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Validate the configuration, bring the hardware to a known state and
    /// return a controller started at `now`.
    ///
    /// Both barriers are lowered, every indicator is switched off and the
    /// default view is drawn.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No peripherals were provided
    /// - The configuration is invalid
    /// - The switch bank does not match the configured slot count
    /// - Any initial actuator or display write fails
    pub fn build(self, now: Instant) -> Result<ParkingController> {
        let Self {
            config,
            peripherals,
            mut store,
            sink,
            clock,
        } = self;
        let mut peripherals = peripherals.ok_or(ControllerError::MissingPeripherals)?;
        config.validate()?;

        let switches = peripherals.slot_switches.count();
        if switches != config.slot_count {
            return Err(ControllerError::SlotCountMismatch {
                configured: config.slot_count,
                available: switches,
            });
        }

        let params = match store.load() {
            Ok(Some(stored)) => {
                info!("Loaded stored parameters");
                stored
            }
            Ok(None) => config.parameters,
            Err(e) => {
                warn!(error = %e, "Parameter store unreadable, using configured defaults");
                config.parameters
            }
        };

        peripherals
            .entry_servo
            .write_angle(config.servo.angle(false, false))?;
        peripherals
            .exit_servo
            .write_angle(config.servo.angle(false, config.servo.exit_inverted))?;
        for index in 0..config.slot_count {
            peripherals.indicators.set(index, false)?;
        }

        let timing = &config.timing;
        let mut display = DisplayScheduler::new(
            config.display.clone(),
            timing.success_message(),
            config.slot_count,
        );
        if let Some(frame) = display.take_frame() {
            peripherals.display.draw(&frame)?;
        }

        let access = AccessController::new(
            AuthorizedBadgeSet::new(config.authorized_badges.iter().cloned()),
            timing.badge_cooldown(),
        );
        let entry = EntryBarrier::new(timing.ultrasonic_poll(), timing.servo_transition());
        let exit = ExitSequencer::new(timing.servo_transition());
        let mut telemetry_timer = Timer::periodic(timing.telemetry_interval());
        telemetry_timer.start(now);

        info!(
            slots = config.slot_count,
            badges = access.authorized().len(),
            "Parking controller started"
        );

        Ok(ParkingController {
            occupancy: Occupancy::new(config.slot_count),
            slots: SlotTracker::new(config.slot_count),
            levels: vec![None; config.slot_count],
            config,
            params,
            peripherals,
            store,
            sink,
            clock,
            access,
            entry,
            exit,
            display,
            telemetry_timer,
            started_at: now,
            last_badge: None,
            last_decision: None,
            last_distance: None,
        })
    }
}

/// Owner of all controller state.
pub struct ParkingController {
    config: ControllerConfig,
    params: ParameterSet,
    peripherals: Peripherals,
    store: Box<dyn ParameterStore>,
    sink: Box<dyn TelemetrySink>,
    clock: Box<dyn WallClock>,
    access: AccessController,
    occupancy: Occupancy,
    entry: EntryBarrier,
    exit: ExitSequencer,
    slots: SlotTracker,
    display: DisplayScheduler,
    telemetry_timer: Timer,
    started_at: Instant,
    last_badge: Option<BadgeId>,
    last_decision: Option<Decision>,
    last_distance: Option<f32>,
    /// Switch levels read this tick; reused to avoid reallocating.
    levels: Vec<Option<bool>>,
}

impl ParkingController {
    pub fn builder() -> ParkingControllerBuilder {
        ParkingControllerBuilder::default()
    }

    /// Run one scheduler pass at `now`.
    pub fn tick(&mut self, now: Instant) {
        self.poll_badge_reader(now);

        let sample = if self.entry.sample_due(now) {
            self.sample_distance()
        } else {
            None
        };
        for action in self.entry.on_tick(now, sample, &self.params) {
            self.apply_entry_action(now, action);
        }
        if let Some(action) = self.exit.on_tick(now, &self.params) {
            self.apply_exit_action(action);
        }

        self.display.on_tick(now, self.occupancy.available());
        self.poll_slot_switches(now);

        if self.telemetry_timer.update(now) {
            let event = TelemetryEvent::SensorReading {
                timestamp: self.wall_time(),
                distance: self.last_distance.unwrap_or_default(),
                uptime_seconds: self.uptime_seconds(now),
                available_slots: self.occupancy.available(),
            };
            self.sink.publish(event);
        }

        self.flush_display();
    }

    fn poll_badge_reader(&mut self, now: Instant) {
        let read = match self.peripherals.badge_reader.poll_badge() {
            Ok(Some(read)) => read,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "Badge reader poll failed");
                return;
            }
        };
        let badge = match BadgeId::from_uid(&read.uid) {
            Ok(badge) => badge,
            Err(e) => {
                warn!(error = %e, uid = %read.uid_hex(), "Unusable badge UID");
                return;
            }
        };

        let decision = self.access.present_badge(
            now,
            &badge,
            &mut self.occupancy,
            self.entry.is_idle(),
        );
        if decision == Decision::Ignored {
            return;
        }
        self.last_decision = Some(decision);

        let access_event = match decision {
            Decision::Granted => {
                if let Some(action) = self.entry.grant(now, &self.params) {
                    self.apply_entry_action(now, action);
                }
                self.display.show(now, Message::Welcome, &self.params);
                Some((true, "entry_granted"))
            }
            Decision::Denied => {
                self.display.show(now, Message::Denied, &self.params);
                Some((false, "denied"))
            }
            Decision::Full => {
                self.display.show(now, Message::Full, &self.params);
                Some((false, "full"))
            }
            Decision::Busy | Decision::Ignored => None,
        };
        if let Some((authorized, action)) = access_event {
            let event = TelemetryEvent::RfidAccess {
                timestamp: self.wall_time(),
                card_uid: badge.to_string(),
                authorized,
                action: action.to_string(),
            };
            self.sink.publish(event);
        }
        self.last_badge = Some(badge);
    }

    fn sample_distance(&mut self) -> Option<DistanceSample> {
        match self.peripherals.distance_sensor.measure() {
            Ok(pulse) => {
                let sample = DistanceSample::from_pulse(pulse);
                if let DistanceSample::Valid(cm) = sample {
                    self.last_distance = Some(cm);
                }
                Some(sample)
            }
            Err(e) => {
                warn!(error = %e, "Distance measurement failed");
                None
            }
        }
    }

    fn apply_entry_action(&mut self, now: Instant, action: EntryAction) {
        match action {
            EntryAction::Raise => {
                self.move_barrier(BarrierKind::Entry, true, "badge_granted");
            }
            EntryAction::CarDetected => debug!("Car under the entry barrier"),
            EntryAction::CarCleared => debug!("Car cleared the entry barrier"),
            EntryAction::NoCarTimeout(PassOutcome::NotDetected) => {
                if self.occupancy.release() {
                    info!(pending = self.occupancy.pending(), "Pending entry released");
                }
                self.display.show(now, Message::NotDetected, &self.params);
            }
            EntryAction::NoCarTimeout(PassOutcome::Detected) => {}
            EntryAction::Lower(outcome) => {
                let reason = match outcome {
                    PassOutcome::Detected => "car_passed",
                    PassOutcome::NotDetected => "no_car_timeout",
                };
                self.move_barrier(BarrierKind::Entry, false, reason);
                if outcome == PassOutcome::Detected {
                    self.display.show(now, Message::Pass, &self.params);
                }
            }
            EntryAction::Ready => debug!("Entry lane ready"),
        }
    }

    fn apply_exit_action(&mut self, action: ExitAction) {
        match action {
            ExitAction::Raise => self.move_barrier(BarrierKind::Exit, true, "slot_vacated"),
            ExitAction::Lower => self.move_barrier(BarrierKind::Exit, false, "exit_hold_elapsed"),
        }
    }

    fn move_barrier(&mut self, barrier: BarrierKind, raised: bool, reason: &str) {
        let (servo, inverted) = match barrier {
            BarrierKind::Entry => (&mut self.peripherals.entry_servo, false),
            BarrierKind::Exit => (
                &mut self.peripherals.exit_servo,
                self.config.servo.exit_inverted,
            ),
        };
        let angle = self.config.servo.angle(raised, inverted);
        if let Err(e) = servo.write_angle(angle) {
            warn!(%barrier, angle, error = %e, "Servo write failed");
        }

        let event_type = if raised {
            BarrierAction::Raised
        } else {
            BarrierAction::Lowered
        };
        info!(%barrier, ?event_type, reason, "Barrier moved");
        let event = TelemetryEvent::BarrierEvent {
            timestamp: self.wall_time(),
            barrier_type: barrier,
            event_type,
            reason: reason.to_string(),
        };
        self.sink.publish(event);
    }

    fn poll_slot_switches(&mut self, now: Instant) {
        for (index, level) in self.levels.iter_mut().enumerate() {
            *level = match self.peripherals.slot_switches.is_pressed(index) {
                Ok(pressed) => Some(pressed),
                Err(e) => {
                    warn!(slot = index + 1, error = %e, "Slot switch read failed");
                    None
                }
            };
        }

        let wall = self.wall_time();
        let events = self.slots.on_tick(&self.levels, &mut self.occupancy, wall);
        for event in events {
            let slot = event.slot();
            let occupied = event.occupied();
            if let Err(e) = self.peripherals.indicators.set(slot.index(), occupied) {
                warn!(%slot, error = %e, "Indicator write failed");
            }
            self.display.refresh_default(self.occupancy.available());
            self.sink.publish(TelemetryEvent::SlotOccupancy {
                timestamp: wall,
                slot_number: slot,
                occupied,
            });
            if let SlotEvent::Vacated { .. } = event {
                self.exit.trigger(now, &self.params);
            }
        }
    }

    fn flush_display(&mut self) {
        if let Some(frame) = self.display.take_frame() {
            if let Err(e) = self.peripherals.display.draw(&frame) {
                warn!(error = %e, "Display draw failed");
            }
        }
    }

    fn wall_time(&self) -> Option<NaiveDateTime> {
        self.clock.now()
    }

    fn uptime_seconds(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.started_at).as_secs()
    }

    /// Snapshot of the controller for the status endpoint.
    pub fn status(&self, now: Instant) -> StatusReport {
        StatusReport {
            badge_id: StatusReport::badge_display(self.last_badge.as_ref().map(BadgeId::as_str)),
            distance_cm: self.last_distance,
            entry_raised: self.entry.is_raised(),
            exit_raised: self.exit.is_raised(),
            available: self.occupancy.available(),
            pending: self.occupancy.pending(),
            uptime_seconds: self.uptime_seconds(now),
            entry_phase: self.entry.phase(),
            exit_phase: self.exit.phase(),
            slots: self
                .slots
                .records()
                .iter()
                .enumerate()
                .map(|(index, record)| SlotStatus::from_record(index, record))
                .collect(),
        }
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    pub fn parameter(&self, parameter: Parameter) -> u32 {
        self.params.get(parameter)
    }

    /// Change a runtime parameter.
    ///
    /// The value takes effect the next time the timer or check using it is
    /// armed. The new set is persisted; a store failure is logged and
    /// reported through [`ParameterChange::persisted`] but does not undo the
    /// change.
    ///
    /// # Errors
    /// Returns an error if the value is outside the parameter's range.
    pub fn set_parameter(&mut self, parameter: Parameter, value: u32) -> Result<ParameterChange> {
        let old = self.params.set(parameter, value)?;
        let persisted = match self.store.save(&self.params) {
            Ok(()) => true,
            Err(e) => {
                warn!(%parameter, error = %e, "Failed to persist parameters");
                false
            }
        };

        info!(%parameter, old, new = value, persisted, "Parameter changed");
        let event = TelemetryEvent::ConfigChange {
            timestamp: self.wall_time(),
            parameter_name: parameter.wire_name().to_string(),
            old_value: old,
            new_value: value,
            changed_by: "api".to_string(),
        };
        self.sink.publish(event);

        Ok(ParameterChange {
            parameter,
            old,
            new: value,
            persisted,
        })
    }

    /// Change a runtime parameter addressed by wire name.
    ///
    /// # Errors
    /// Returns an error for an unknown name or an out-of-range value.
    pub fn set_parameter_by_name(&mut self, name: &str, value: u32) -> Result<ParameterChange> {
        let parameter: Parameter = name.parse()?;
        self.set_parameter(parameter, value)
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    pub fn entry(&self) -> &EntryBarrier {
        &self.entry
    }

    pub fn exit(&self) -> &ExitSequencer {
        &self.exit
    }

    pub fn slots(&self) -> &SlotTracker {
        &self.slots
    }

    pub fn display(&self) -> &DisplayScheduler {
        &self.display
    }

    pub fn last_badge(&self) -> Option<&BadgeId> {
        self.last_badge.as_ref()
    }

    /// Decision on the last badge read that was not ignored.
    pub fn last_decision(&self) -> Option<Decision> {
        self.last_decision
    }
}

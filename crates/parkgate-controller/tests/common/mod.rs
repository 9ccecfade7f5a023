//! Common test utilities for controller integration tests.
//!
//! The [`Rig`] wires a [`ParkingController`] to mock peripherals, an
//! in-memory parameter store, a memory telemetry sink and a manual wall
//! clock, and drives it with a synthetic monotonic clock in 10 ms ticks.
//!
//! ```ignore
//! let mut rig = Rig::new();
//! rig.present(AUTHORIZED_BADGE);
//! rig.run_for(3_000);
//! assert!(rig.handles.display.has_shown("Bienvenido!"));
//! ```

#![allow(dead_code)]

use std::time::{Duration, Instant};

use chrono::{NaiveDate, NaiveDateTime};
use parkgate_controller::clock::ManualClock;
use parkgate_controller::store::MemoryStore;
use parkgate_controller::telemetry::MemorySink;
use parkgate_controller::{MockHandles, ParkingController, Peripherals};
use parkgate_core::{ControllerConfig, TelemetryEvent};

/// Authorized in the default configuration.
pub const AUTHORIZED_BADGE: &str = "1C:21:09:49";

/// Second badge authorized in the default configuration.
pub const OTHER_AUTHORIZED_BADGE: &str = "43:23:7A:1A";

/// Not in the default configuration.
pub const UNKNOWN_BADGE: &str = "DE:AD:BE:EF";

/// Scheduler period used by the rig.
pub const TICK: Duration = Duration::from_millis(10);

pub struct Rig {
    pub controller: ParkingController,
    pub handles: MockHandles,
    pub sink: MemorySink,
    pub store: MemoryStore,
    pub clock: ManualClock,
    pub start: Instant,
    pub now: Instant,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    pub fn with_config(config: ControllerConfig) -> Self {
        Self::with_store(config, MemoryStore::new())
    }

    pub fn with_store(config: ControllerConfig, store: MemoryStore) -> Self {
        let (peripherals, handles) = Peripherals::mock(config.slot_count);
        let sink = MemorySink::new();
        let clock = ManualClock::new(Some(morning()));
        let start = Instant::now();

        let controller = ParkingController::builder()
            .with_config(config)
            .with_peripherals(peripherals)
            .with_store(store.clone())
            .with_sink(sink.clone())
            .with_clock(clock.clone())
            .build(start)
            .expect("controller should build on mock peripherals");

        Self {
            controller,
            handles,
            sink,
            store,
            clock,
            start,
            now: start,
        }
    }

    /// Advance both clocks by one tick and run the scheduler.
    pub fn tick(&mut self) {
        self.now += TICK;
        self.clock.advance(chrono::Duration::milliseconds(10));
        self.controller.tick(self.now);
    }

    /// Tick repeatedly for `ms` milliseconds.
    pub fn run_for(&mut self, ms: u64) {
        for _ in 0..ms / 10 {
            self.tick();
        }
    }

    /// Present a badge and run the tick that reads it.
    pub fn present(&mut self, badge: &str) {
        self.handles
            .badge_reader
            .present(uid(badge))
            .expect("mock reader accepts the card");
        self.tick();
    }

    /// Milliseconds since the controller was built.
    pub fn elapsed_ms(&self) -> u128 {
        self.now.duration_since(self.start).as_millis()
    }

    pub fn available(&self) -> usize {
        self.controller.occupancy().available()
    }

    pub fn pending(&self) -> usize {
        self.controller.occupancy().pending()
    }

    /// Barrier events as `(barrier, event, reason)` strings.
    pub fn barrier_events(&self) -> Vec<(String, String, String)> {
        self.sink
            .of_kind("barrier_event")
            .into_iter()
            .filter_map(|event| match event {
                TelemetryEvent::BarrierEvent {
                    barrier_type,
                    event_type,
                    reason,
                    ..
                } => Some((
                    barrier_type.to_string(),
                    format!("{event_type:?}").to_lowercase(),
                    reason,
                )),
                _ => None,
            })
            .collect()
    }

    /// RFID access events as `(card, authorized, action)`.
    pub fn access_events(&self) -> Vec<(String, bool, String)> {
        self.sink
            .of_kind("rfid_access")
            .into_iter()
            .filter_map(|event| match event {
                TelemetryEvent::RfidAccess {
                    card_uid,
                    authorized,
                    action,
                    ..
                } => Some((card_uid, authorized, action)),
                _ => None,
            })
            .collect()
    }
}

/// Raw UID bytes of a `XX:XX:...` badge id.
pub fn uid(badge: &str) -> Vec<u8> {
    badge
        .split(':')
        .map(|octet| u8::from_str_radix(octet, 16).expect("hex octet"))
        .collect()
}

/// Wall-clock time the rig starts at.
pub fn morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 5, 20)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .expect("valid date")
}

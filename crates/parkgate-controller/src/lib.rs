//! Parking facility controller.
//!
//! This crate holds the control logic of a single-board parking facility: badge
//! authorization at the entry, the entry barrier state machine with ultrasonic
//! vehicle detection, the timed exit barrier, per-slot occupancy tracking and
//! the character display. Everything runs on one thread through
//! [`ParkingController::tick`], which never blocks.
//!
//! # Components
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`access`] | Badge cooldown, authorization and entry gating |
//! | [`entry`] | Entry barrier: raise, detect the car, lower |
//! | [`exit`] | Exit barrier: delayed raise, hold, lower |
//! | [`slots`] | Slot switch edges, entry/exit timestamps |
//! | [`occupancy`] | Available slots and pending entries |
//! | [`display`] | Transient messages and the default view |
//! | [`telemetry`] | Best-effort event sinks |
//! | [`store`] | Parameter persistence |
//!
//! Each state machine is a plain value advanced with the current [`Instant`],
//! so it can be driven in tests with a synthetic clock and fake readings.
//!
//! [`Instant`]: std::time::Instant
//!
//! # Examples
//!
//! ```
//! use parkgate_controller::{ParkingController, Peripherals};
//! use parkgate_controller::clock::UnsyncedClock;
//! use parkgate_core::ControllerConfig;
//! use std::time::{Duration, Instant};
//!
//! let (peripherals, handles) = Peripherals::mock(2);
//! let t0 = Instant::now();
//! let mut controller = ParkingController::builder()
//!     .with_config(ControllerConfig::default())
//!     .with_peripherals(peripherals)
//!     .with_clock(UnsyncedClock)
//!     .build(t0)
//!     .unwrap();
//!
//! handles.slot_switches.press(0);
//! controller.tick(t0 + Duration::from_millis(10));
//!
//! assert_eq!(controller.occupancy().available(), 1);
//! assert!(handles.indicators.is_on(0));
//! ```

pub mod access;
pub mod clock;
pub mod controller;
pub mod display;
pub mod entry;
pub mod error;
pub mod exit;
pub mod occupancy;
pub mod peripherals;
pub mod sensor;
pub mod slots;
pub mod status;
pub mod store;
pub mod telemetry;

pub use access::{AccessController, AuthorizedBadgeSet, Decision};
pub use controller::{ParameterChange, ParkingController, ParkingControllerBuilder};
pub use entry::{EntryAction, EntryBarrier, EntryPhase, PassOutcome};
pub use error::{ControllerError, Result};
pub use exit::{ExitAction, ExitPhase, ExitSequencer};
pub use peripherals::{MockHandles, Peripherals};
pub use sensor::DistanceSample;
pub use status::{SlotStatus, StatusReport};

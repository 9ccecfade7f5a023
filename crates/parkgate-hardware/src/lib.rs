//! Hardware abstraction layer for the parking controller.
//!
//! This crate defines trait interfaces for the facility's peripherals and
//! mock implementations of each, so the controller can run against real
//! drivers, a simulation, or scripted tests without change.
//!
//! # Design Philosophy
//!
//! - **Non-blocking**: every method returns promptly. The controller calls
//!   them from a single cooperative loop and never awaits.
//! - **Object-safe**: all traits can be used as trait objects (`Box<dyn Trait>`).
//! - **Send**: peripherals can move with the controller into a Tokio task.
//! - **Error-aware**: all operations return [`Result<T>`] with a
//!   [`HardwareError`] describing the fault.
//!
//! # Devices
//!
//! | Trait | Device |
//! |-------|--------|
//! | [`BadgeReader`] | MFRC522 RFID reader at the entry |
//! | [`DistanceSensor`] | HC-SR04 ultrasonic sensor under the entry barrier |
//! | [`SlotSwitches`] | one presence switch per slot |
//! | [`SlotIndicators`] | one indicator light per slot |
//! | [`ServoDriver`] | entry and exit barrier servos |
//! | [`TextDisplay`] | 16x2 character display |
//!
//! ```
//! use parkgate_hardware::{DistanceSensor, Result};
//!
//! fn read_cm(sensor: &mut dyn DistanceSensor) -> Result<Option<f32>> {
//!     Ok(sensor.measure()?.distance_cm())
//! }
//! ```

pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use traits::{
    BadgeReader, DistanceSensor, ServoDriver, SlotIndicators, SlotSwitches, TextDisplay,
};
pub use types::{CardRead, ECHO_TIMEOUT_US, EchoPulse, MAX_UID_LEN, MIN_UID_LEN};

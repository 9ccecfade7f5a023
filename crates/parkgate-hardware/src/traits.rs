//! Hardware device trait definitions.
//!
//! These traits are the contract between the parking controller and its
//! peripherals. The controller runs a cooperative loop on a single thread, so
//! every method is synchronous and must return promptly:
//!
//! - Reads report the current state and never wait for a new event.
//! - The only bounded wait is the ultrasonic echo measurement, capped at
//!   [`ECHO_TIMEOUT_US`](crate::types::ECHO_TIMEOUT_US).
//! - Actuator commands are fire-and-forget; motion completes in the
//!   background.
//!
//! All traits are object-safe and require `Send`, so a controller holding
//! `Box<dyn Trait>` peripherals can be moved into a Tokio task.

use crate::error::Result;
use crate::types::{CardRead, EchoPulse};

/// RFID/NFC badge reader.
pub trait BadgeReader: Send {
    /// Return the card currently in the field, if any.
    ///
    /// A card resting on the reader may be reported on consecutive polls;
    /// duplicate suppression is the caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader cannot be reached.
    fn poll_badge(&mut self) -> Result<Option<CardRead>>;
}

/// Ultrasonic distance sensor.
pub trait DistanceSensor: Send {
    /// Perform one ranging cycle.
    ///
    /// Implementations must return within the echo timeout, reporting
    /// [`EchoPulse::NoEcho`] when nothing answered.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor cannot be driven.
    fn measure(&mut self) -> Result<EchoPulse>;
}

/// Per-slot presence switches.
pub trait SlotSwitches: Send {
    /// Number of switches.
    fn count(&self) -> usize;

    /// Whether the switch at `index` is pressed (slot occupied).
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range or the input cannot be read.
    fn is_pressed(&mut self, index: usize) -> Result<bool>;
}

/// Hobby servo driving a barrier arm.
pub trait ServoDriver: Send {
    /// Command the servo to an absolute angle in degrees (0-180).
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be delivered.
    fn write_angle(&mut self, angle: u8) -> Result<()>;
}

/// Per-slot indicator lights.
pub trait SlotIndicators: Send {
    /// Switch the indicator at `index` on or off.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is out of range or the output fails.
    fn set(&mut self, index: usize, on: bool) -> Result<()>;
}

/// Character display showing whole frames of text.
pub trait TextDisplay: Send {
    /// Replace the displayed frame with `lines`.
    ///
    /// Lines are already fitted to the display width by the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the display does not accept the frame.
    fn draw(&mut self, lines: &[String]) -> Result<()>;
}

//! Mock device implementations for testing and development.
//!
//! Every mock comes paired with a handle sharing its state: the device half is
//! handed to the controller, the handle stays with the test or simulation to
//! drive inputs and inspect outputs.

pub mod actuators;
pub mod badge_reader;
pub mod distance;
pub mod switches;

// Re-export commonly used types
pub use actuators::{MockDisplay, MockDisplayHandle, MockServo, MockServoHandle};
pub use badge_reader::{MockBadgeReader, MockBadgeReaderHandle};
pub use distance::{MockDistanceSensor, MockDistanceSensorHandle};
pub use switches::{MockIndicators, MockIndicatorsHandle, MockSlotSwitches, MockSlotSwitchesHandle};

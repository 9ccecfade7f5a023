//! Error types for hardware operations.
//!
//! Device drivers report every failure as a [`HardwareError`]. The controller
//! treats these as fatal during initialization and as logged, recoverable
//! faults once the scheduler loop is running.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The device stopped answering or its backing channel closed.
    #[error("{device} disconnected")]
    Disconnected { device: String },

    /// A value the device cannot accept or produce (UID length, angle).
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Switch or indicator index past the end of the bank.
    #[error("Channel {index} out of range for {device} with {count} channels")]
    ChannelOutOfRange {
        device: String,
        index: usize,
        count: usize,
    },

    #[error("Actuator fault: {message}")]
    ActuatorFault { message: String },

    /// Bus-level failure (SPI, I2C, echo line).
    #[error("Bus error: {message}")]
    Bus { message: String },
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn channel_out_of_range(device: impl Into<String>, index: usize, count: usize) -> Self {
        Self::ChannelOutOfRange {
            device: device.into(),
            index,
            count,
        }
    }

    pub fn actuator_fault(message: impl Into<String>) -> Self {
        Self::ActuatorFault {
            message: message.into(),
        }
    }

    pub fn bus(message: impl Into<String>) -> Self {
        Self::Bus {
            message: message.into(),
        }
    }
}

use parkgate_hardware::HardwareError;
use thiserror::Error;

/// Errors raised while building or reconfiguring the controller.
///
/// Once built, the scheduler loop itself never fails: device faults during a
/// tick are logged and the tick carries on.
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error(transparent)]
    Core(#[from] parkgate_core::Error),

    #[error("Hardware initialization failed: {0}")]
    Hardware(#[from] HardwareError),

    #[error("Configured {configured} slots but the switch bank has {available}")]
    SlotCountMismatch { configured: usize, available: usize },

    #[error("Missing peripherals")]
    MissingPeripherals,
}

pub type Result<T> = std::result::Result<T, ControllerError>;

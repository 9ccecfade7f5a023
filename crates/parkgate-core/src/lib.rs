//! Core types shared by the parkgate crates.
//!
//! This crate has no hardware or async dependencies: it defines the domain
//! identifiers, the non-blocking [`Timer`] primitive, runtime parameters,
//! configuration and the telemetry event model.

pub mod config;
pub mod constants;
pub mod error;
pub mod params;
pub mod telemetry;
pub mod timer;
pub mod types;

pub use config::ControllerConfig;
pub use error::{Error, Result};
pub use params::{Parameter, ParameterSet};
pub use telemetry::{BarrierAction, TelemetryEvent};
pub use timer::{Timer, TimerMode};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Default values for the parking controller.
//!
//! Every constant here is the factory default of a field in
//! [`ControllerConfig`](crate::config::ControllerConfig) or
//! [`ParameterSet`](crate::params::ParameterSet). Deployments override them
//! through the JSON configuration file; the runtime parameters can also be
//! changed while the controller is running.
//!
//! # Usage
//!
//! ```
//! use parkgate_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(DEFAULT_SLOT_COUNT, 2);
//! let cooldown = Duration::from_millis(DEFAULT_BADGE_COOLDOWN_MS);
//! assert_eq!(cooldown.as_secs(), 2);
//! ```

// ============================================================================
// Facility
// ============================================================================

/// Number of physical parking slots.
pub const DEFAULT_SLOT_COUNT: usize = 2;

/// Badges accepted by a factory-fresh controller.
pub const DEFAULT_AUTHORIZED_BADGES: [&str; 2] = ["1C:21:09:49", "43:23:7A:1A"];

// ============================================================================
// Badge identifiers
// ============================================================================

/// Minimum number of UID bytes in a badge identifier (MIFARE single size).
pub const MIN_BADGE_BYTES: usize = 4;

/// Maximum number of UID bytes in a badge identifier (MIFARE triple size).
pub const MAX_BADGE_BYTES: usize = 10;

/// Separator between hex octets of a rendered badge identifier.
pub const BADGE_SEPARATOR: char = ':';

// ============================================================================
// Timing (milliseconds)
// ============================================================================

/// Minimum delay between two processed badge reads.
///
/// A card resting on the reader is reported on every poll; reads arriving
/// within this window are ignored.
pub const DEFAULT_BADGE_COOLDOWN_MS: u64 = 2000;

/// Interval between two ultrasonic samples while a car is expected.
pub const DEFAULT_ULTRASONIC_POLL_MS: u64 = 100;

/// Duration of the welcome and pass-through messages.
pub const DEFAULT_SUCCESS_MESSAGE_MS: u64 = 3000;

/// Time a servo needs to reach its commanded angle.
pub const DEFAULT_SERVO_TRANSITION_MS: u64 = 500;

/// Interval between two periodic sensor telemetry events.
pub const DEFAULT_TELEMETRY_INTERVAL_MS: u64 = 5000;

/// Time allowed for the telemetry client to reach the collector.
pub const DEFAULT_TELEMETRY_CONNECT_TIMEOUT_MS: u64 = 3000;

// ============================================================================
// Runtime parameter defaults
// ============================================================================

/// Distance below which a car is considered present, in centimeters.
pub const DEFAULT_ULTRASONIC_THRESHOLD_CM: u32 = 30;

/// Maximum wait for a car after the entry barrier is raised.
pub const DEFAULT_NO_CAR_TIMEOUT_MS: u32 = 5000;

/// Wait between the car clearing the beam and the entry barrier lowering.
pub const DEFAULT_LOWER_WAIT_MS: u32 = 3000;

/// Duration of the denied, full and not-detected messages.
pub const DEFAULT_DISPLAY_MESSAGE_MS: u32 = 3000;

/// Delay between a slot being vacated and the exit barrier rising.
pub const DEFAULT_EXIT_RAISE_MS: u32 = 3000;

/// Time the exit barrier stays up.
pub const DEFAULT_EXIT_LOWER_MS: u32 = 3000;

/// Upper bound for every millisecond parameter (ten minutes).
pub const MAX_PARAMETER_MS: u32 = 600_000;

// ============================================================================
// Ultrasonic sensor
// ============================================================================

/// Shortest distance the HC-SR04 reports reliably, in centimeters.
pub const MIN_VALID_DISTANCE_CM: f32 = 2.0;

/// Longest distance the HC-SR04 reports reliably, in centimeters.
pub const MAX_VALID_DISTANCE_CM: f32 = 400.0;

// ============================================================================
// Actuators and display
// ============================================================================

/// Servo angle of a lowered barrier.
pub const DEFAULT_SERVO_DOWN_ANGLE: u8 = 0;

/// Servo angle of a raised barrier.
pub const DEFAULT_SERVO_UP_ANGLE: u8 = 90;

/// Full servo travel, used to mirror a mechanically inverted servo.
pub const SERVO_FULL_TRAVEL: u8 = 180;

/// Character columns of the 16x2 LCD.
pub const DEFAULT_DISPLAY_COLUMNS: usize = 16;

/// Text rows of the 16x2 LCD.
pub const DISPLAY_ROWS: usize = 2;

// ============================================================================
// Telemetry
// ============================================================================

/// Capacity of the queue between the controller and the telemetry client.
pub const DEFAULT_TELEMETRY_QUEUE: usize = 64;

/// Timestamp format of telemetry events.
pub const TELEMETRY_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Timestamp format of status report entry and exit times.
pub const STATUS_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Placeholder for a status timestamp that was never recorded.
pub const TIMESTAMP_UNSET: &str = "--";

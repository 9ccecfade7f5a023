//! Controller configuration.
//!
//! The whole configuration is a single JSON document. Every field has a
//! default, so an empty object `{}` describes a factory-fresh two-slot
//! facility.
//!
//! ```
//! use parkgate_core::ControllerConfig;
//!
//! let config = ControllerConfig::from_json_str(r#"{"slot_count": 4}"#).unwrap();
//! assert_eq!(config.slot_count, 4);
//! assert_eq!(config.authorized_badges.len(), 2);
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::params::ParameterSet;
use crate::types::BadgeId;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Number of physical slots, each with a switch and an indicator.
    pub slot_count: usize,
    /// Badges allowed to open the entry barrier.
    pub authorized_badges: Vec<BadgeId>,
    /// Initial runtime parameters, overridden by the parameter store.
    pub parameters: ParameterSet,
    pub timing: TimingConfig,
    pub servo: ServoConfig,
    pub display: DisplayConfig,
    pub telemetry: TelemetryConfig,
}

/// Fixed delays, not adjustable at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub badge_cooldown_ms: u64,
    pub ultrasonic_poll_ms: u64,
    pub success_message_ms: u64,
    pub servo_transition_ms: u64,
    pub telemetry_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    pub up_angle: u8,
    pub down_angle: u8,
    /// The exit servo is mounted mirrored and receives `180 - angle`.
    pub exit_inverted: bool,
}

/// Display geometry and message texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub columns: usize,
    pub ready: String,
    pub welcome: [String; 2],
    pub denied: [String; 2],
    pub full: [String; 2],
    pub pass: [String; 2],
    pub not_detected: [String; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub addr: SocketAddr,
    pub queue_capacity: usize,
    pub connect_timeout_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            slot_count: DEFAULT_SLOT_COUNT,
            authorized_badges: DEFAULT_AUTHORIZED_BADGES
                .iter()
                .filter_map(|badge| BadgeId::parse(badge).ok())
                .collect(),
            parameters: ParameterSet::default(),
            timing: TimingConfig::default(),
            servo: ServoConfig::default(),
            display: DisplayConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            badge_cooldown_ms: DEFAULT_BADGE_COOLDOWN_MS,
            ultrasonic_poll_ms: DEFAULT_ULTRASONIC_POLL_MS,
            success_message_ms: DEFAULT_SUCCESS_MESSAGE_MS,
            servo_transition_ms: DEFAULT_SERVO_TRANSITION_MS,
            telemetry_interval_ms: DEFAULT_TELEMETRY_INTERVAL_MS,
        }
    }
}

impl TimingConfig {
    pub fn badge_cooldown(&self) -> Duration {
        Duration::from_millis(self.badge_cooldown_ms)
    }

    pub fn ultrasonic_poll(&self) -> Duration {
        Duration::from_millis(self.ultrasonic_poll_ms)
    }

    pub fn success_message(&self) -> Duration {
        Duration::from_millis(self.success_message_ms)
    }

    pub fn servo_transition(&self) -> Duration {
        Duration::from_millis(self.servo_transition_ms)
    }

    pub fn telemetry_interval(&self) -> Duration {
        Duration::from_millis(self.telemetry_interval_ms)
    }
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            up_angle: DEFAULT_SERVO_UP_ANGLE,
            down_angle: DEFAULT_SERVO_DOWN_ANGLE,
            exit_inverted: false,
        }
    }
}

impl ServoConfig {
    /// Angle to write to a servo for the requested barrier position.
    ///
    /// # Examples
    ///
    /// ```
    /// use parkgate_core::config::ServoConfig;
    ///
    /// let servo = ServoConfig { exit_inverted: true, ..ServoConfig::default() };
    /// assert_eq!(servo.angle(true, false), 90);
    /// assert_eq!(servo.angle(true, true), 90);
    /// assert_eq!(servo.angle(false, true), 180);
    /// ```
    pub fn angle(&self, raised: bool, inverted: bool) -> u8 {
        let angle = if raised { self.up_angle } else { self.down_angle };
        if inverted {
            SERVO_FULL_TRAVEL.saturating_sub(angle)
        } else {
            angle
        }
    }
}

fn pair(first: &str, second: &str) -> [String; 2] {
    [first.to_string(), second.to_string()]
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_DISPLAY_COLUMNS,
            ready: "Sistema Listo".to_string(),
            welcome: pair("Bienvenido!", "Acceso concedido"),
            denied: pair("ACCESO", "DENEGADO"),
            full: pair("LLENO", "Intente luego"),
            pass: pair("Pase seguro", "Gracias!"),
            not_detected: pair("No se detecto", "Intentelo de nuevo"),
        }
    }
}

impl DisplayConfig {
    /// Every configured line of text, ready view first.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.ready.as_str()).chain(
            [
                &self.welcome,
                &self.denied,
                &self.full,
                &self.pass,
                &self.not_detected,
            ]
            .into_iter()
            .flatten()
            .map(String::as_str),
        )
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            queue_capacity: DEFAULT_TELEMETRY_QUEUE,
            connect_timeout_ms: DEFAULT_TELEMETRY_CONNECT_TIMEOUT_MS,
        }
    }
}

impl TelemetryConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl ControllerConfig {
    /// Parse and validate a configuration document.
    ///
    /// # Errors
    /// Returns `Error::Json` for malformed JSON (including malformed badge
    /// identifiers) and `Error::Config` if validation fails.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ControllerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read, otherwise as
    /// [`ControllerConfig::from_json_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check cross-field constraints serde cannot express.
    ///
    /// # Errors
    /// Returns `Error::Config` describing the first violated constraint, or
    /// `Error::InvalidParameterValue` for an out-of-range parameter.
    pub fn validate(&self) -> Result<()> {
        if self.slot_count == 0 {
            return Err(Error::config("slot_count must be at least 1"));
        }
        if self.display.columns == 0 {
            return Err(Error::config("display.columns must be at least 1"));
        }
        if !self.display.texts().all(|text| text.is_ascii()) {
            return Err(Error::config("display texts must be ASCII"));
        }

        let timings = [
            ("timing.badge_cooldown_ms", self.timing.badge_cooldown_ms),
            ("timing.ultrasonic_poll_ms", self.timing.ultrasonic_poll_ms),
            ("timing.success_message_ms", self.timing.success_message_ms),
            ("timing.telemetry_interval_ms", self.timing.telemetry_interval_ms),
        ];
        if let Some((name, _)) = timings.iter().find(|(_, value)| *value == 0) {
            return Err(Error::config(format!("{name} must be greater than zero")));
        }

        if self.servo.up_angle > SERVO_FULL_TRAVEL || self.servo.down_angle > SERVO_FULL_TRAVEL {
            return Err(Error::config(format!(
                "servo angles must be within 0-{SERVO_FULL_TRAVEL}"
            )));
        }
        if self.telemetry.enabled && self.telemetry.queue_capacity == 0 {
            return Err(Error::config("telemetry.queue_capacity must be at least 1"));
        }

        self.parameters.validate()
    }
}

//! Runtime-adjustable controller parameters.
//!
//! Parameters are plain integers addressed by a stable wire name, the same
//! name used by the persisted `config.json` and by the status API. Changing a
//! parameter never touches a running timer; the owning state machine reads
//! the new value the next time it arms that timer.
//!
//! | Parameter | Wire name | Unit | Range |
//! |-----------|-----------|------|-------|
//! | [`Parameter::UltrasonicThreshold`] | `ULTRASONIC_THRESHOLD` | cm | 2-400 |
//! | [`Parameter::NoCarTimeout`] | `ULTRASONIC_TIMEOUT_MS` | ms | 100-600000 |
//! | [`Parameter::LowerWait`] | `LOWER_BARRIER_WAIT_MS` | ms | 0-600000 |
//! | [`Parameter::MessageDuration`] | `DISPLAY_MESSAGE_MS` | ms | 100-600000 |
//! | [`Parameter::ExitRaiseDelay`] | `EXIT_RAISE_MS` | ms | 0-600000 |
//! | [`Parameter::ExitLowerDelay`] | `SALIDA_DELAY_MS` | ms | 0-600000 |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DISPLAY_MESSAGE_MS, DEFAULT_EXIT_LOWER_MS, DEFAULT_EXIT_RAISE_MS,
    DEFAULT_LOWER_WAIT_MS, DEFAULT_NO_CAR_TIMEOUT_MS, DEFAULT_ULTRASONIC_THRESHOLD_CM,
    MAX_PARAMETER_MS,
};
use crate::{Error, Result};

/// Shortest accepted no-car timeout or message duration.
const MIN_VISIBLE_MS: u32 = 100;

/// A named runtime parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    /// Distance below which the ultrasonic sensor reports a car, in cm.
    UltrasonicThreshold,
    /// Maximum wait for a car once the entry barrier is up.
    NoCarTimeout,
    /// Wait between the car clearing the sensor and the entry barrier lowering.
    LowerWait,
    /// Duration of the denied, full and not-detected messages.
    MessageDuration,
    /// Delay between a slot being vacated and the exit barrier rising.
    ExitRaiseDelay,
    /// Time the exit barrier is held up.
    ExitLowerDelay,
}

impl Parameter {
    /// Every parameter, in wire order.
    pub const ALL: [Parameter; 6] = [
        Parameter::UltrasonicThreshold,
        Parameter::NoCarTimeout,
        Parameter::LowerWait,
        Parameter::MessageDuration,
        Parameter::ExitRaiseDelay,
        Parameter::ExitLowerDelay,
    ];

    /// Name used on the wire and in the persisted configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use parkgate_core::Parameter;
    ///
    /// assert_eq!(Parameter::NoCarTimeout.wire_name(), "ULTRASONIC_TIMEOUT_MS");
    /// ```
    pub fn wire_name(&self) -> &'static str {
        match self {
            Parameter::UltrasonicThreshold => "ULTRASONIC_THRESHOLD",
            Parameter::NoCarTimeout => "ULTRASONIC_TIMEOUT_MS",
            Parameter::LowerWait => "LOWER_BARRIER_WAIT_MS",
            Parameter::MessageDuration => "DISPLAY_MESSAGE_MS",
            Parameter::ExitRaiseDelay => "EXIT_RAISE_MS",
            Parameter::ExitLowerDelay => "SALIDA_DELAY_MS",
        }
    }

    /// Inclusive range of accepted values.
    pub fn range(&self) -> (u32, u32) {
        match self {
            Parameter::UltrasonicThreshold => (2, 400),
            Parameter::NoCarTimeout | Parameter::MessageDuration => {
                (MIN_VISIBLE_MS, MAX_PARAMETER_MS)
            }
            Parameter::LowerWait | Parameter::ExitRaiseDelay | Parameter::ExitLowerDelay => {
                (0, MAX_PARAMETER_MS)
            }
        }
    }

    /// Check a candidate value against [`Parameter::range`].
    ///
    /// # Errors
    /// Returns `Error::InvalidParameterValue` if the value is out of range.
    pub fn validate(&self, value: u32) -> Result<u32> {
        let (min, max) = self.range();
        if !(min..=max).contains(&value) {
            return Err(Error::InvalidParameterValue {
                name: self.wire_name(),
                value,
                min,
                max,
            });
        }
        Ok(value)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Parameter {
    type Err = Error;

    /// Parse a wire name. `EXIT_LOWER_MS` is accepted as an alias of
    /// `SALIDA_DELAY_MS`.
    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("EXIT_LOWER_MS") {
            return Ok(Parameter::ExitLowerDelay);
        }
        Parameter::ALL
            .into_iter()
            .find(|p| p.wire_name().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::UnknownParameter(name.to_string()))
    }
}

/// Current values of every runtime parameter.
///
/// Serialized as a flat JSON object keyed by wire name; missing keys take
/// their default value.
///
/// # Examples
///
/// ```
/// use parkgate_core::{Parameter, ParameterSet};
///
/// let mut params = ParameterSet::default();
/// let old = params.set(Parameter::UltrasonicThreshold, 25).unwrap();
///
/// assert_eq!(old, 30);
/// assert_eq!(params.get(Parameter::UltrasonicThreshold), 25);
/// assert!(params.set(Parameter::UltrasonicThreshold, 1_000).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSet {
    #[serde(rename = "ULTRASONIC_THRESHOLD")]
    ultrasonic_threshold_cm: u32,
    #[serde(rename = "ULTRASONIC_TIMEOUT_MS")]
    no_car_timeout_ms: u32,
    #[serde(rename = "LOWER_BARRIER_WAIT_MS")]
    lower_wait_ms: u32,
    #[serde(rename = "DISPLAY_MESSAGE_MS")]
    message_ms: u32,
    #[serde(rename = "EXIT_RAISE_MS")]
    exit_raise_ms: u32,
    #[serde(rename = "SALIDA_DELAY_MS", alias = "EXIT_LOWER_MS")]
    exit_lower_ms: u32,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            ultrasonic_threshold_cm: DEFAULT_ULTRASONIC_THRESHOLD_CM,
            no_car_timeout_ms: DEFAULT_NO_CAR_TIMEOUT_MS,
            lower_wait_ms: DEFAULT_LOWER_WAIT_MS,
            message_ms: DEFAULT_DISPLAY_MESSAGE_MS,
            exit_raise_ms: DEFAULT_EXIT_RAISE_MS,
            exit_lower_ms: DEFAULT_EXIT_LOWER_MS,
        }
    }
}

impl ParameterSet {
    /// Current value of a parameter.
    pub fn get(&self, parameter: Parameter) -> u32 {
        match parameter {
            Parameter::UltrasonicThreshold => self.ultrasonic_threshold_cm,
            Parameter::NoCarTimeout => self.no_car_timeout_ms,
            Parameter::LowerWait => self.lower_wait_ms,
            Parameter::MessageDuration => self.message_ms,
            Parameter::ExitRaiseDelay => self.exit_raise_ms,
            Parameter::ExitLowerDelay => self.exit_lower_ms,
        }
    }

    /// Set a parameter and return its previous value.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameterValue` if the value is out of range; the
    /// set is left unchanged.
    pub fn set(&mut self, parameter: Parameter, value: u32) -> Result<u32> {
        let value = parameter.validate(value)?;
        let slot = match parameter {
            Parameter::UltrasonicThreshold => &mut self.ultrasonic_threshold_cm,
            Parameter::NoCarTimeout => &mut self.no_car_timeout_ms,
            Parameter::LowerWait => &mut self.lower_wait_ms,
            Parameter::MessageDuration => &mut self.message_ms,
            Parameter::ExitRaiseDelay => &mut self.exit_raise_ms,
            Parameter::ExitLowerDelay => &mut self.exit_lower_ms,
        };
        Ok(std::mem::replace(slot, value))
    }

    /// Value of a millisecond parameter as a [`Duration`].
    pub fn duration(&self, parameter: Parameter) -> Duration {
        Duration::from_millis(u64::from(self.get(parameter)))
    }

    /// Distance threshold in centimeters.
    pub fn threshold_cm(&self) -> f32 {
        self.ultrasonic_threshold_cm as f32
    }

    /// Check every value against its range.
    ///
    /// # Errors
    /// Returns the first `Error::InvalidParameterValue` found.
    pub fn validate(&self) -> Result<()> {
        for parameter in Parameter::ALL {
            parameter.validate(self.get(parameter))?;
        }
        Ok(())
    }

    /// Iterate over `(parameter, value)` pairs in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (Parameter, u32)> + '_ {
        Parameter::ALL.into_iter().map(|p| (p, self.get(p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ULTRASONIC_THRESHOLD", Parameter::UltrasonicThreshold)]
    #[case("ultrasonic_timeout_ms", Parameter::NoCarTimeout)]
    #[case("LOWER_BARRIER_WAIT_MS", Parameter::LowerWait)]
    #[case("DISPLAY_MESSAGE_MS", Parameter::MessageDuration)]
    #[case("EXIT_RAISE_MS", Parameter::ExitRaiseDelay)]
    #[case("SALIDA_DELAY_MS", Parameter::ExitLowerDelay)]
    #[case("EXIT_LOWER_MS", Parameter::ExitLowerDelay)]
    fn test_parse_wire_names(#[case] name: &str, #[case] expected: Parameter) {
        assert_eq!(name.parse::<Parameter>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_name() {
        let err = "TEMPERATURE".parse::<Parameter>().unwrap_err();
        assert!(matches!(err, Error::UnknownParameter(name) if name == "TEMPERATURE"));
    }

    #[test]
    fn test_defaults_match_factory_values() {
        let params = ParameterSet::default();
        assert_eq!(params.get(Parameter::UltrasonicThreshold), 30);
        assert_eq!(params.get(Parameter::NoCarTimeout), 5000);
        assert_eq!(params.get(Parameter::LowerWait), 3000);
        assert_eq!(params.get(Parameter::MessageDuration), 3000);
        assert_eq!(params.get(Parameter::ExitRaiseDelay), 3000);
        assert_eq!(params.get(Parameter::ExitLowerDelay), 3000);
        assert!(params.validate().is_ok());
    }

    #[rstest]
    #[case(Parameter::UltrasonicThreshold, 1)]
    #[case(Parameter::UltrasonicThreshold, 401)]
    #[case(Parameter::NoCarTimeout, 0)]
    #[case(Parameter::MessageDuration, 99)]
    #[case(Parameter::ExitLowerDelay, 600_001)]
    fn test_set_rejects_out_of_range(#[case] parameter: Parameter, #[case] value: u32) {
        let mut params = ParameterSet::default();
        let before = params;

        assert!(matches!(
            params.set(parameter, value),
            Err(Error::InvalidParameterValue { .. })
        ));
        assert_eq!(params, before);
    }

    #[test]
    fn test_set_returns_old_value() {
        let mut params = ParameterSet::default();
        assert_eq!(params.set(Parameter::LowerWait, 0).unwrap(), 3000);
        assert_eq!(params.set(Parameter::LowerWait, 1500).unwrap(), 0);
        assert_eq!(params.duration(Parameter::LowerWait), Duration::from_millis(1500));
    }

    #[test]
    fn test_json_uses_wire_names() {
        let mut params = ParameterSet::default();
        params.set(Parameter::ExitLowerDelay, 4500).unwrap();

        let json = serde_json::to_value(params).unwrap();
        assert_eq!(json["SALIDA_DELAY_MS"], 4500);
        assert_eq!(json["ULTRASONIC_THRESHOLD"], 30);
    }

    #[test]
    fn test_json_missing_keys_take_defaults() {
        let params: ParameterSet =
            serde_json::from_str(r#"{"ULTRASONIC_THRESHOLD": 45, "EXIT_LOWER_MS": 1000}"#)
                .unwrap();

        assert_eq!(params.get(Parameter::UltrasonicThreshold), 45);
        assert_eq!(params.get(Parameter::ExitLowerDelay), 1000);
        assert_eq!(params.get(Parameter::NoCarTimeout), 5000);
    }

    #[test]
    fn test_iter_follows_wire_order() {
        let names: Vec<_> = ParameterSet::default()
            .iter()
            .map(|(p, _)| p.wire_name())
            .collect();
        assert_eq!(names.first(), Some(&"ULTRASONIC_THRESHOLD"));
        assert_eq!(names.len(), 6);
    }
}

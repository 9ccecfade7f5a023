//! Classification of raw ultrasonic readings.

use parkgate_core::constants::{MAX_VALID_DISTANCE_CM, MIN_VALID_DISTANCE_CM};
use parkgate_hardware::EchoPulse;
use serde::Serialize;

/// One ultrasonic reading, checked against the sensor's rated range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "cm", rename_all = "snake_case")]
pub enum DistanceSample {
    /// Within the rated 2-400 cm range.
    Valid(f32),
    /// An echo was received but the distance is implausible.
    OutOfRange(f32),
    /// No echo before the measurement timeout.
    NoEcho,
}

impl DistanceSample {
    /// Classify an echo pulse.
    ///
    /// # Examples
    ///
    /// ```
    /// use parkgate_controller::DistanceSample;
    /// use parkgate_hardware::EchoPulse;
    ///
    /// let sample = DistanceSample::from_pulse(EchoPulse::from_distance_cm(25.0));
    /// assert_eq!(sample.car_present(30.0), Some(true));
    ///
    /// let sample = DistanceSample::from_pulse(EchoPulse::from_distance_cm(1.0));
    /// assert_eq!(sample.car_present(30.0), None);
    /// ```
    pub fn from_pulse(pulse: EchoPulse) -> Self {
        match pulse.distance_cm() {
            None => DistanceSample::NoEcho,
            Some(cm) if (MIN_VALID_DISTANCE_CM..=MAX_VALID_DISTANCE_CM).contains(&cm) => {
                DistanceSample::Valid(cm)
            }
            Some(cm) => DistanceSample::OutOfRange(cm),
        }
    }

    /// Distance in centimeters, when an echo was received.
    pub fn distance_cm(&self) -> Option<f32> {
        match self {
            DistanceSample::Valid(cm) | DistanceSample::OutOfRange(cm) => Some(*cm),
            DistanceSample::NoEcho => None,
        }
    }

    /// Whether a car blocks the sensor, or `None` for an unusable reading.
    pub fn car_present(&self, threshold_cm: f32) -> Option<bool> {
        match self {
            DistanceSample::Valid(cm) => Some(*cm < threshold_cm),
            DistanceSample::OutOfRange(_) | DistanceSample::NoEcho => None,
        }
    }
}

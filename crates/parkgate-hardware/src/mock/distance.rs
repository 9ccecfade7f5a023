//! Mock ultrasonic distance sensor.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{DistanceSensor, EchoPulse, HardwareError, Result};

#[derive(Debug)]
struct SensorState {
    /// One-off readings consumed before `steady`.
    queued: VecDeque<EchoPulse>,
    /// Reading repeated once the queue is empty.
    steady: EchoPulse,
    measurements: usize,
    fail_next: bool,
}

/// Mock distance sensor whose readings are scripted through a handle.
///
/// With nothing scripted the sensor reports [`EchoPulse::NoEcho`], like an
/// HC-SR04 facing an empty lane.
///
/// # Examples
///
/// ```
/// use parkgate_hardware::DistanceSensor;
/// use parkgate_hardware::mock::MockDistanceSensor;
///
/// let (mut sensor, handle) = MockDistanceSensor::new();
/// handle.set_distance_cm(120.0);
/// handle.queue_distance_cm(12.0);
///
/// let first = sensor.measure().unwrap().distance_cm().unwrap();
/// let second = sensor.measure().unwrap().distance_cm().unwrap();
/// assert!(first < 13.0);
/// assert!(second > 119.0);
/// ```
#[derive(Debug)]
pub struct MockDistanceSensor {
    state: Arc<Mutex<SensorState>>,
}

impl MockDistanceSensor {
    pub fn new() -> (Self, MockDistanceSensorHandle) {
        let state = Arc::new(Mutex::new(SensorState {
            queued: VecDeque::new(),
            steady: EchoPulse::NoEcho,
            measurements: 0,
            fail_next: false,
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockDistanceSensorHandle { state },
        )
    }
}

impl DistanceSensor for MockDistanceSensor {
    fn measure(&mut self) -> Result<EchoPulse> {
        let mut state = self.state.lock();
        state.measurements += 1;
        if std::mem::take(&mut state.fail_next) {
            return Err(HardwareError::bus("echo pin stuck"));
        }
        let steady = state.steady;
        Ok(state.queued.pop_front().unwrap_or(steady))
    }
}

/// Handle for scripting a [`MockDistanceSensor`].
#[derive(Debug, Clone)]
pub struct MockDistanceSensorHandle {
    state: Arc<Mutex<SensorState>>,
}

impl MockDistanceSensorHandle {
    /// Report `distance_cm` on every measurement from now on.
    pub fn set_distance_cm(&self, distance_cm: f32) {
        self.set_pulse(EchoPulse::from_distance_cm(distance_cm));
    }

    /// Report no echo on every measurement from now on.
    pub fn set_no_echo(&self) {
        self.set_pulse(EchoPulse::NoEcho);
    }

    /// Replace the steady reading and discard queued ones.
    pub fn set_pulse(&self, pulse: EchoPulse) {
        let mut state = self.state.lock();
        state.queued.clear();
        state.steady = pulse;
    }

    /// Report `distance_cm` once, ahead of the steady reading.
    pub fn queue_distance_cm(&self, distance_cm: f32) {
        self.queue_pulse(EchoPulse::from_distance_cm(distance_cm));
    }

    pub fn queue_pulse(&self, pulse: EchoPulse) {
        self.state.lock().queued.push_back(pulse);
    }

    /// Make the next measurement fail with a bus error.
    pub fn fail_next(&self) {
        self.state.lock().fail_next = true;
    }

    /// Number of measurements taken so far.
    pub fn measurement_count(&self) -> usize {
        self.state.lock().measurements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reading_is_no_echo() {
        let (mut sensor, handle) = MockDistanceSensor::new();
        assert_eq!(sensor.measure().unwrap(), EchoPulse::NoEcho);
        assert_eq!(handle.measurement_count(), 1);
    }

    #[test]
    fn test_queue_then_steady() {
        let (mut sensor, handle) = MockDistanceSensor::new();
        handle.set_distance_cm(200.0);
        handle.queue_pulse(EchoPulse::NoEcho);

        assert_eq!(sensor.measure().unwrap(), EchoPulse::NoEcho);
        let cm = sensor.measure().unwrap().distance_cm().unwrap();
        assert!((cm - 200.0).abs() < 0.1);
    }

    #[test]
    fn test_set_pulse_discards_queue() {
        let (mut sensor, handle) = MockDistanceSensor::new();
        handle.queue_distance_cm(5.0);
        handle.set_no_echo();
        assert_eq!(sensor.measure().unwrap(), EchoPulse::NoEcho);
    }

    #[test]
    fn test_fail_next_fails_once() {
        let (mut sensor, handle) = MockDistanceSensor::new();
        handle.fail_next();
        assert!(sensor.measure().is_err());
        assert!(sensor.measure().is_ok());
        assert_eq!(handle.measurement_count(), 2);
    }
}

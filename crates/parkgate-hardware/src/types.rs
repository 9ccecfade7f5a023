//! Data types exchanged with hardware devices.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HardwareError, Result};

/// Ceiling on an ultrasonic echo measurement, in microseconds.
///
/// At 30 ms the echo has travelled over 5 m, beyond the sensor's rated range.
pub const ECHO_TIMEOUT_US: u64 = 30_000;

/// Speed of sound in centimeters per microsecond.
pub const SOUND_CM_PER_US: f32 = 0.0343;

/// Minimum UID length of an ISO 14443 card.
pub const MIN_UID_LEN: usize = 4;

/// Maximum UID length of an ISO 14443 card.
pub const MAX_UID_LEN: usize = 10;

/// A card seen by a badge reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRead {
    /// Card unique identifier (4-10 bytes).
    pub uid: Vec<u8>,

    /// When the card was read.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl CardRead {
    /// Create a card read stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the UID length is outside 4-10 bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use parkgate_hardware::CardRead;
    ///
    /// let card = CardRead::new(vec![0x1C, 0x21, 0x09, 0x49]).unwrap();
    /// assert_eq!(card.uid_hex(), "1C:21:09:49");
    /// ```
    pub fn new(uid: Vec<u8>) -> Result<Self> {
        if !(MIN_UID_LEN..=MAX_UID_LEN).contains(&uid.len()) {
            return Err(HardwareError::invalid_input(format!(
                "UID must be {MIN_UID_LEN}-{MAX_UID_LEN} bytes, got {}",
                uid.len()
            )));
        }
        Ok(Self {
            uid,
            timestamp: chrono::Utc::now(),
        })
    }

    /// UID rendered as upper-case hex octets separated by `:`.
    pub fn uid_hex(&self) -> String {
        self.uid
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(":")
    }
}

/// Result of one ultrasonic ranging cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EchoPulse {
    /// Width of the echo pulse.
    Echo(Duration),
    /// No echo within [`ECHO_TIMEOUT_US`].
    NoEcho,
}

impl EchoPulse {
    /// Echo pulse for an obstacle at the given distance.
    ///
    /// Used by simulated sensors; the inverse of [`EchoPulse::distance_cm`].
    pub fn from_distance_cm(distance_cm: f32) -> Self {
        let micros = (distance_cm.max(0.0) * 2.0 / SOUND_CM_PER_US).round() as u64;
        if micros > ECHO_TIMEOUT_US {
            return EchoPulse::NoEcho;
        }
        EchoPulse::Echo(Duration::from_micros(micros))
    }

    /// Distance to the obstacle, or `None` if there was no echo.
    ///
    /// # Examples
    ///
    /// ```
    /// use parkgate_hardware::EchoPulse;
    /// use std::time::Duration;
    ///
    /// let pulse = EchoPulse::Echo(Duration::from_micros(1_000));
    /// let cm = pulse.distance_cm().unwrap();
    /// assert!((cm - 17.15).abs() < 0.01);
    /// assert_eq!(EchoPulse::NoEcho.distance_cm(), None);
    /// ```
    pub fn distance_cm(&self) -> Option<f32> {
        match self {
            EchoPulse::Echo(width) => Some(width.as_micros() as f32 * SOUND_CM_PER_US / 2.0),
            EchoPulse::NoEcho => None,
        }
    }
}

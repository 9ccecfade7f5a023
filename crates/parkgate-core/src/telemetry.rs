//! Telemetry events pushed to the external collector.
//!
//! Each event serializes to one JSON document of the form
//! `{"type": "<kind>", "data": {...}}`. The `timestamp` inside `data` is local
//! wall-clock time formatted `YYYY-MM-DDTHH:MM:SS`, omitted when the clock has
//! not been synchronized.
//!
//! ```
//! use parkgate_core::{BarrierKind, telemetry::{BarrierAction, TelemetryEvent}};
//!
//! let event = TelemetryEvent::BarrierEvent {
//!     timestamp: None,
//!     barrier_type: BarrierKind::Exit,
//!     event_type: BarrierAction::Raised,
//!     reason: "slot_vacated".to_string(),
//! };
//! let json = serde_json::to_string(&event).unwrap();
//! assert_eq!(
//!     json,
//!     r#"{"type":"barrier_event","data":{"barrier_type":"exit","event_type":"raised","reason":"slot_vacated"}}"#
//! );
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::types::{BarrierKind, SlotNumber};

/// Movement reported by a barrier event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarrierAction {
    Raised,
    Lowered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// Periodic snapshot of the distance sensor and availability.
    SensorReading {
        #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp_format")]
        timestamp: Option<NaiveDateTime>,
        distance: f32,
        uptime_seconds: u64,
        available_slots: usize,
    },
    BarrierEvent {
        #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp_format")]
        timestamp: Option<NaiveDateTime>,
        barrier_type: BarrierKind,
        event_type: BarrierAction,
        reason: String,
    },
    /// Outcome of a badge presented at the entry reader.
    RfidAccess {
        #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp_format")]
        timestamp: Option<NaiveDateTime>,
        card_uid: String,
        authorized: bool,
        action: String,
    },
    SlotOccupancy {
        #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp_format")]
        timestamp: Option<NaiveDateTime>,
        slot_number: SlotNumber,
        occupied: bool,
    },
    /// A runtime parameter was changed through the parameter API.
    ConfigChange {
        #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp_format")]
        timestamp: Option<NaiveDateTime>,
        parameter_name: String,
        old_value: u32,
        new_value: u32,
        changed_by: String,
    },
}

impl TelemetryEvent {
    /// Wire name of the event kind, as found in the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            TelemetryEvent::SensorReading { .. } => "sensor_reading",
            TelemetryEvent::BarrierEvent { .. } => "barrier_event",
            TelemetryEvent::RfidAccess { .. } => "rfid_access",
            TelemetryEvent::SlotOccupancy { .. } => "slot_occupancy",
            TelemetryEvent::ConfigChange { .. } => "config_change",
        }
    }

    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            TelemetryEvent::SensorReading { timestamp, .. }
            | TelemetryEvent::BarrierEvent { timestamp, .. }
            | TelemetryEvent::RfidAccess { timestamp, .. }
            | TelemetryEvent::SlotOccupancy { timestamp, .. }
            | TelemetryEvent::ConfigChange { timestamp, .. } => *timestamp,
        }
    }

    /// Serialize as a single line of JSON, without the trailing newline.
    ///
    /// # Errors
    /// Returns `Error::Json` if serialization fails.
    pub fn to_json_line(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::constants::TELEMETRY_TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(at) => {
                serializer.collect_str(&at.format(TELEMETRY_TIMESTAMP_FORMAT))
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let text: Option<String> = Option::deserialize(deserializer)?;
        text.map(|text| {
            NaiveDateTime::parse_from_str(&text, TELEMETRY_TIMESTAMP_FORMAT)
                .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}

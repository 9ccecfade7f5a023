//! Status snapshot served to the status endpoint.

use parkgate_core::SlotNumber;
use parkgate_core::constants::TIMESTAMP_UNSET;
use serde::Serialize;

use crate::entry::EntryPhase;
use crate::exit::ExitPhase;
use crate::slots::SlotRecord;

/// Point-in-time view of the whole controller.
///
/// Serializes to the JSON document returned by the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    /// Last badge read at the entry reader, or `--`.
    pub badge_id: String,
    /// Last valid distance reading in cm.
    pub distance_cm: Option<f32>,
    pub entry_raised: bool,
    pub exit_raised: bool,
    pub available: usize,
    pub pending: usize,
    pub uptime_seconds: u64,
    pub entry_phase: EntryPhase,
    pub exit_phase: ExitPhase,
    pub slots: Vec<SlotStatus>,
}

/// One slot as shown in the status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotStatus {
    pub slot: SlotNumber,
    pub occupied: bool,
    /// `YYYY-MM-DD HH:MM:SS`, or `--` if never recorded.
    pub last_entry: String,
    /// `YYYY-MM-DD HH:MM:SS`, or `--` if never recorded.
    pub last_exit: String,
}

impl SlotStatus {
    pub fn from_record(index: usize, record: &SlotRecord) -> Self {
        Self {
            slot: SlotNumber::from_index(index),
            occupied: record.occupied,
            last_entry: record.last_entry_display(),
            last_exit: record.last_exit_display(),
        }
    }
}

impl StatusReport {
    pub(crate) fn badge_display(badge: Option<&str>) -> String {
        badge.unwrap_or(TIMESTAMP_UNSET).to_string()
    }
}

//! Per-slot occupancy tracking.
//!
//! Each tick the controller reads every slot switch and hands the levels to
//! [`SlotTracker::on_tick`]. Only level changes produce events: a stable
//! switch generates nothing however many ticks it is read. A failed switch
//! read keeps the slot's previous state.

use chrono::NaiveDateTime;
use parkgate_core::SlotNumber;
use parkgate_core::constants::{STATUS_TIMESTAMP_FORMAT, TIMESTAMP_UNSET};
use serde::Serialize;
use tracing::info;

use crate::occupancy::{Occupancy, OccupationKind};

/// State of one physical slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlotRecord {
    pub occupied: bool,
    pub last_entry: Option<NaiveDateTime>,
    pub last_exit: Option<NaiveDateTime>,
}

impl SlotRecord {
    /// `last_entry` as shown in the status report.
    pub fn last_entry_display(&self) -> String {
        format_timestamp(self.last_entry)
    }

    /// `last_exit` as shown in the status report.
    pub fn last_exit_display(&self) -> String {
        format_timestamp(self.last_exit)
    }
}

fn format_timestamp(at: Option<NaiveDateTime>) -> String {
    at.map_or_else(
        || TIMESTAMP_UNSET.to_string(),
        |at| at.format(STATUS_TIMESTAMP_FORMAT).to_string(),
    )
}

/// A debounced level change on a slot switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotEvent {
    Occupied {
        slot: SlotNumber,
        kind: OccupationKind,
    },
    Vacated {
        slot: SlotNumber,
    },
}

impl SlotEvent {
    pub fn slot(&self) -> SlotNumber {
        match self {
            SlotEvent::Occupied { slot, .. } | SlotEvent::Vacated { slot } => *slot,
        }
    }

    pub fn occupied(&self) -> bool {
        matches!(self, SlotEvent::Occupied { .. })
    }
}

/// Records of every slot, in slot order.
///
/// # Examples
///
/// ```
/// use parkgate_controller::occupancy::Occupancy;
/// use parkgate_controller::slots::{SlotEvent, SlotTracker};
///
/// let mut tracker = SlotTracker::new(2);
/// let mut occupancy = Occupancy::new(2);
///
/// let events = tracker.on_tick(&[Some(true), Some(false)], &mut occupancy, None);
/// assert_eq!(events.len(), 1);
/// assert!(events[0].occupied());
/// assert_eq!(occupancy.available(), 1);
///
/// // Same levels again: nothing new.
/// assert!(tracker.on_tick(&[Some(true), Some(false)], &mut occupancy, None).is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct SlotTracker {
    records: Vec<SlotRecord>,
}

impl SlotTracker {
    /// Tracker for `count` slots, all vacant.
    pub fn new(count: usize) -> Self {
        Self {
            records: vec![SlotRecord::default(); count],
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SlotRecord] {
        &self.records
    }

    pub fn record(&self, slot: SlotNumber) -> Option<&SlotRecord> {
        self.records.get(slot.index())
    }

    pub fn occupied_count(&self) -> usize {
        self.records.iter().filter(|record| record.occupied).count()
    }

    /// Apply one round of switch levels.
    ///
    /// `levels[i]` is the level of slot `i + 1`, or `None` when the read
    /// failed. Extra levels beyond the slot count are ignored. `wall` stamps
    /// entry and exit times; `None` clears the stamp rather than keeping an
    /// older visit's time.
    pub fn on_tick(
        &mut self,
        levels: &[Option<bool>],
        occupancy: &mut Occupancy,
        wall: Option<NaiveDateTime>,
    ) -> Vec<SlotEvent> {
        let mut events = Vec::new();

        for (index, (record, level)) in self.records.iter_mut().zip(levels).enumerate() {
            let Some(pressed) = *level else {
                continue;
            };
            if pressed == record.occupied {
                continue;
            }

            let slot = SlotNumber::from_index(index);
            record.occupied = pressed;
            if pressed {
                record.last_entry = wall;
                let kind = occupancy.occupy();
                info!(
                    %slot,
                    ?kind,
                    available = occupancy.available(),
                    pending = occupancy.pending(),
                    "Slot occupied"
                );
                events.push(SlotEvent::Occupied { slot, kind });
            } else {
                record.last_exit = wall;
                occupancy.vacate();
                info!(%slot, available = occupancy.available(), "Slot vacated");
                events.push(SlotEvent::Vacated { slot });
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .unwrap()
    }

    #[test]
    fn test_occupation_consumes_reservation() {
        let mut tracker = SlotTracker::new(2);
        let mut occupancy = Occupancy::new(2);
        occupancy.reserve();

        let events = tracker.on_tick(&[Some(false), Some(true)], &mut occupancy, Some(at(8, 30)));

        assert_eq!(
            events,
            vec![SlotEvent::Occupied {
                slot: SlotNumber::from_index(1),
                kind: OccupationKind::Reserved
            }]
        );
        assert_eq!(occupancy.pending(), 0);
        assert_eq!(occupancy.available(), 1);
        assert_eq!(tracker.records()[1].last_entry, Some(at(8, 30)));
    }

    #[test]
    fn test_vacate_stamps_exit_and_restores_availability() {
        let mut tracker = SlotTracker::new(1);
        let mut occupancy = Occupancy::new(1);

        tracker.on_tick(&[Some(true)], &mut occupancy, Some(at(8, 0)));
        let events = tracker.on_tick(&[Some(false)], &mut occupancy, Some(at(17, 45)));

        assert_eq!(
            events,
            vec![SlotEvent::Vacated {
                slot: SlotNumber::from_index(0)
            }]
        );
        assert_eq!(occupancy.available(), 1);
        let record = &tracker.records()[0];
        assert!(!record.occupied);
        assert_eq!(record.last_entry_display(), "2025-06-01 08:00:00");
        assert_eq!(record.last_exit_display(), "2025-06-01 17:45:00");
    }

    #[test]
    fn test_failed_read_keeps_previous_state() {
        let mut tracker = SlotTracker::new(1);
        let mut occupancy = Occupancy::new(1);
        tracker.on_tick(&[Some(true)], &mut occupancy, None);

        assert!(tracker.on_tick(&[None], &mut occupancy, None).is_empty());
        assert!(tracker.records()[0].occupied);
        assert_eq!(occupancy.available(), 0);
    }

    #[test]
    fn test_unknown_time_keeps_sentinel() {
        let mut tracker = SlotTracker::new(1);
        let mut occupancy = Occupancy::new(1);
        tracker.on_tick(&[Some(true)], &mut occupancy, None);

        let record = &tracker.records()[0];
        assert_eq!(record.last_entry, None);
        assert_eq!(record.last_entry_display(), "--");
        assert_eq!(record.last_exit_display(), "--");
    }

    #[test]
    fn test_unknown_time_replaces_previous_visit() {
        let mut tracker = SlotTracker::new(1);
        let mut occupancy = Occupancy::new(1);
        tracker.on_tick(&[Some(true)], &mut occupancy, Some(at(8, 0)));
        tracker.on_tick(&[Some(false)], &mut occupancy, Some(at(9, 0)));

        tracker.on_tick(&[Some(true)], &mut occupancy, None);
        assert_eq!(tracker.records()[0].last_entry_display(), "--");
        assert_eq!(tracker.records()[0].last_exit_display(), "2025-06-01 09:00:00");

        tracker.on_tick(&[Some(false)], &mut occupancy, None);
        assert_eq!(tracker.records()[0].last_exit_display(), "--");
    }

    #[test]
    fn test_simultaneous_edges_in_slot_order() {
        let mut tracker = SlotTracker::new(3);
        let mut occupancy = Occupancy::new(3);

        let events = tracker.on_tick(&[Some(true), Some(true), Some(true)], &mut occupancy, None);

        let slots: Vec<_> = events.iter().map(|e| e.slot().get()).collect();
        assert_eq!(slots, vec![1, 2, 3]);
        assert_eq!(tracker.occupied_count(), 3);
        assert!(occupancy.is_full());
    }
}

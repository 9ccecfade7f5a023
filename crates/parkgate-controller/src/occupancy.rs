//! Availability and reservation counters.

use serde::Serialize;

/// How a slot occupation was matched against reservations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupationKind {
    /// Consumed a pending entry created by a granted badge.
    Reserved,
    /// No pending entry; a car parked without badging in.
    Unreserved,
}

/// Facility-wide occupancy counters.
///
/// `available` stays within `0..=capacity` whatever order events arrive in.
/// A granted badge creates a pending entry but does not reduce `available`;
/// only a slot actually being occupied does. Pending entries still hold
/// their slot: the facility is full once every available slot is spoken for,
/// so `pending <= available` as long as grants go through [`Occupancy::is_full`].
///
/// # Examples
///
/// ```
/// use parkgate_controller::occupancy::{Occupancy, OccupationKind};
///
/// let mut occupancy = Occupancy::new(2);
/// occupancy.reserve();
/// assert_eq!(occupancy.available(), 2);
///
/// assert_eq!(occupancy.occupy(), OccupationKind::Reserved);
/// assert_eq!(occupancy.available(), 1);
/// assert_eq!(occupancy.pending(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occupancy {
    capacity: usize,
    available: usize,
    pending: usize,
}

impl Occupancy {
    /// Counters for an empty facility of `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            available: capacity,
            pending: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.available
    }

    /// Granted entries not yet matched to an occupation.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// No slot is left for a new grant: every available slot is either
    /// gone or reserved by a pending entry.
    pub fn is_full(&self) -> bool {
        self.available <= self.pending
    }

    /// Record a granted entry awaiting its occupation.
    pub fn reserve(&mut self) {
        self.pending += 1;
    }

    /// Drop one pending entry, if any.
    ///
    /// Returns `true` if a reservation was released.
    pub fn release(&mut self) -> bool {
        if self.pending == 0 {
            return false;
        }
        self.pending -= 1;
        true
    }

    /// Record a slot becoming occupied.
    pub fn occupy(&mut self) -> OccupationKind {
        self.available = self.available.saturating_sub(1);
        if self.release() {
            OccupationKind::Reserved
        } else {
            OccupationKind::Unreserved
        }
    }

    /// Record a slot becoming vacant.
    pub fn vacate(&mut self) {
        self.available = (self.available + 1).min(self.capacity);
    }
}

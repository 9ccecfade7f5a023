//! Badge authorization and entry gating.
//!
//! The [`AccessController`] decides what happens when a badge is presented at
//! the entry reader. It suppresses duplicate reads of a badge resting on the
//! reader, checks the badge against the [`AuthorizedBadgeSet`], refuses entry
//! when the facility is full and records a pending entry for every granted
//! badge.
//!
//! # Decision order
//!
//! 1. Within the read cooldown of the previous processed read: [`Decision::Ignored`].
//! 2. Badge not authorized: [`Decision::Denied`].
//! 3. No slot available: [`Decision::Full`].
//! 4. Entry lane still busy with a previous car: [`Decision::Busy`].
//! 5. Otherwise: [`Decision::Granted`] and one more pending entry.
//!
//! Every read that is not ignored restarts the cooldown.

use std::fmt;
use std::time::{Duration, Instant};

use parkgate_core::{BadgeId, Timer};
use serde::Serialize;
use tracing::{debug, info};

use crate::occupancy::Occupancy;

/// Outcome of presenting a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Entry allowed: barrier raised, pending entry recorded.
    Granted,
    /// Badge not in the authorized set.
    Denied,
    /// Badge authorized but no slot is available.
    Full,
    /// Badge authorized but the entry lane has not finished the previous car.
    Busy,
    /// Read suppressed by the cooldown; nothing happened.
    Ignored,
}

impl Decision {
    /// Wire name used in telemetry and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Granted => "granted",
            Decision::Denied => "denied",
            Decision::Full => "full",
            Decision::Busy => "busy",
            Decision::Ignored => "ignored",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Badges allowed to enter, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct AuthorizedBadgeSet {
    badges: Vec<BadgeId>,
}

impl AuthorizedBadgeSet {
    pub fn new(badges: impl IntoIterator<Item = BadgeId>) -> Self {
        Self {
            badges: badges.into_iter().collect(),
        }
    }

    /// Whether `badge` is authorized.
    ///
    /// Every entry is compared, so the time taken does not depend on which
    /// entry matched.
    pub fn contains(&self, badge: &BadgeId) -> bool {
        self.badges
            .iter()
            .fold(false, |found, candidate| found | (candidate == badge))
    }

    pub fn len(&self) -> usize {
        self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BadgeId> {
        self.badges.iter()
    }
}

/// Gatekeeper for the entry reader.
///
/// # Examples
///
/// ```
/// use parkgate_controller::{AccessController, AuthorizedBadgeSet, Decision};
/// use parkgate_controller::occupancy::Occupancy;
/// use parkgate_core::BadgeId;
/// use std::time::{Duration, Instant};
///
/// let badge: BadgeId = "1C:21:09:49".parse().unwrap();
/// let mut access = AccessController::new(
///     AuthorizedBadgeSet::new([badge.clone()]),
///     Duration::from_secs(2),
/// );
/// let mut occupancy = Occupancy::new(2);
/// let t0 = Instant::now();
///
/// assert_eq!(access.present_badge(t0, &badge, &mut occupancy, true), Decision::Granted);
/// assert_eq!(occupancy.pending(), 1);
///
/// // Same badge still on the reader a moment later.
/// let later = t0 + Duration::from_millis(100);
/// assert_eq!(access.present_badge(later, &badge, &mut occupancy, true), Decision::Ignored);
/// ```
#[derive(Debug, Clone)]
pub struct AccessController {
    authorized: AuthorizedBadgeSet,
    cooldown: Timer,
}

impl AccessController {
    pub fn new(authorized: AuthorizedBadgeSet, cooldown: Duration) -> Self {
        Self {
            authorized,
            cooldown: Timer::one_shot(cooldown),
        }
    }

    pub fn authorized(&self) -> &AuthorizedBadgeSet {
        &self.authorized
    }

    /// Whether a read at `now` would be suppressed by the cooldown.
    pub fn is_cooling_down(&self, now: Instant) -> bool {
        self.cooldown
            .remaining(now)
            .is_some_and(|left| !left.is_zero())
    }

    /// Decide on a badge presented at `now`.
    ///
    /// `lane_idle` reports whether the entry barrier is ready for a new car.
    /// A granted badge adds one pending entry to `occupancy`; no other
    /// outcome touches the counters. A busy lane leaves the cooldown alone,
    /// so a badge held on the reader is taken as soon as the lane is idle.
    pub fn present_badge(
        &mut self,
        now: Instant,
        badge: &BadgeId,
        occupancy: &mut Occupancy,
        lane_idle: bool,
    ) -> Decision {
        if self.cooldown.is_running() && !self.cooldown.update(now) {
            debug!(badge = %badge, "Badge read within cooldown, ignored");
            return Decision::Ignored;
        }

        let decision = if !self.authorized.contains(badge) {
            Decision::Denied
        } else if occupancy.is_full() {
            Decision::Full
        } else if !lane_idle {
            Decision::Busy
        } else {
            occupancy.reserve();
            Decision::Granted
        };

        if decision == Decision::Busy {
            debug!(badge = %badge, "Entry lane busy, badge not taken");
            return decision;
        }
        self.cooldown.start(now);

        info!(
            badge = %badge,
            decision = %decision,
            available = occupancy.available(),
            pending = occupancy.pending(),
            "Badge presented"
        );
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn badge(text: &str) -> BadgeId {
        text.parse().unwrap()
    }

    fn controller() -> AccessController {
        AccessController::new(
            AuthorizedBadgeSet::new([badge("1C:21:09:49"), badge("43:23:7A:1A")]),
            Duration::from_millis(2000),
        )
    }

    #[test]
    fn test_authorized_set_matches_case_insensitively() {
        let set = AuthorizedBadgeSet::new([badge("1C:21:09:49")]);
        assert!(set.contains(&badge("1c:21:09:49")));
        assert!(!set.contains(&badge("00:00:00:00")));
        assert_eq!(set.len(), 1);
    }

    #[rstest]
    #[case("1C:21:09:49", Decision::Granted, 1)]
    #[case("43:23:7a:1a", Decision::Granted, 1)]
    #[case("00:00:00:00", Decision::Denied, 0)]
    fn test_decision_on_empty_facility(
        #[case] presented: &str,
        #[case] expected: Decision,
        #[case] pending: usize,
    ) {
        let mut access = controller();
        let mut occupancy = Occupancy::new(2);

        let decision = access.present_badge(Instant::now(), &badge(presented), &mut occupancy, true);

        assert_eq!(decision, expected);
        assert_eq!(occupancy.pending(), pending);
        assert_eq!(occupancy.available(), 2);
    }

    #[test]
    fn test_full_facility_creates_no_reservation() {
        let mut access = controller();
        let mut occupancy = Occupancy::new(1);
        occupancy.occupy();

        let decision =
            access.present_badge(Instant::now(), &badge("1C:21:09:49"), &mut occupancy, true);

        assert_eq!(decision, Decision::Full);
        assert_eq!(occupancy.pending(), 0);
    }

    #[test]
    fn test_unauthorized_badge_is_denied_even_when_full() {
        let mut access = controller();
        let mut occupancy = Occupancy::new(1);
        occupancy.occupy();

        let decision =
            access.present_badge(Instant::now(), &badge("00:00:00:00"), &mut occupancy, true);
        assert_eq!(decision, Decision::Denied);
    }

    #[test]
    fn test_busy_lane_creates_no_reservation() {
        let mut access = controller();
        let mut occupancy = Occupancy::new(2);

        let decision =
            access.present_badge(Instant::now(), &badge("1C:21:09:49"), &mut occupancy, false);

        assert_eq!(decision, Decision::Busy);
        assert_eq!(occupancy.pending(), 0);
    }

    #[test]
    fn test_busy_lane_does_not_start_cooldown() {
        let mut access = controller();
        let mut occupancy = Occupancy::new(2);
        let t0 = Instant::now();

        let busy = access.present_badge(t0, &badge("1C:21:09:49"), &mut occupancy, false);
        assert_eq!(busy, Decision::Busy);
        assert!(!access.is_cooling_down(t0));

        let granted = access.present_badge(
            t0 + Duration::from_millis(10),
            &badge("1C:21:09:49"),
            &mut occupancy,
            true,
        );
        assert_eq!(granted, Decision::Granted);
        assert_eq!(occupancy.pending(), 1);
    }

    #[test]
    fn test_reserved_slot_is_not_granted_twice() {
        let mut access = controller();
        let mut occupancy = Occupancy::new(1);
        let t0 = Instant::now();

        assert_eq!(
            access.present_badge(t0, &badge("1C:21:09:49"), &mut occupancy, true),
            Decision::Granted
        );
        let second = access.present_badge(
            t0 + Duration::from_secs(5),
            &badge("43:23:7A:1A"),
            &mut occupancy,
            true,
        );

        assert_eq!(second, Decision::Full);
        assert_eq!(occupancy.pending(), 1);
        assert_eq!(occupancy.available(), 1);
    }

    #[test]
    fn test_cooldown_suppresses_any_badge() {
        let mut access = controller();
        let mut occupancy = Occupancy::new(2);
        let t0 = Instant::now();

        access.present_badge(t0, &badge("00:00:00:00"), &mut occupancy, true);
        let second = access.present_badge(
            t0 + Duration::from_millis(1999),
            &badge("1C:21:09:49"),
            &mut occupancy,
            true,
        );

        assert_eq!(second, Decision::Ignored);
        assert_eq!(occupancy.pending(), 0);
        assert!(access.is_cooling_down(t0 + Duration::from_millis(1999)));
    }

    #[test]
    fn test_read_after_cooldown_is_processed() {
        let mut access = controller();
        let mut occupancy = Occupancy::new(2);
        let t0 = Instant::now();

        assert_eq!(
            access.present_badge(t0, &badge("1C:21:09:49"), &mut occupancy, true),
            Decision::Granted
        );
        assert_eq!(
            access.present_badge(
                t0 + Duration::from_millis(2000),
                &badge("1C:21:09:49"),
                &mut occupancy,
                true
            ),
            Decision::Granted
        );
        assert_eq!(occupancy.pending(), 2);
    }

    #[test]
    fn test_ignored_read_does_not_extend_cooldown() {
        let mut access = controller();
        let mut occupancy = Occupancy::new(2);
        let t0 = Instant::now();

        access.present_badge(t0, &badge("00:00:00:00"), &mut occupancy, true);
        access.present_badge(t0 + Duration::from_millis(1500), &badge("00:00:00:00"), &mut occupancy, true);

        assert!(!access.is_cooling_down(t0 + Duration::from_millis(2000)));
    }
}

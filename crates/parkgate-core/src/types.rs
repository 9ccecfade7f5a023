use crate::{
    Result,
    constants::{BADGE_SEPARATOR, MAX_BADGE_BYTES, MIN_BADGE_BYTES},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// RFID badge identifier in canonical `XX:XX:XX:XX` form.
///
/// Parsing is case-insensitive and tolerant of surrounding whitespace; the
/// stored form is always upper-case hex octets joined by `:`. Between four and
/// ten octets are accepted, covering single, double and triple size UIDs.
///
/// # Security
/// Equality is evaluated in constant time so the authorization check does not
/// leak how many leading octets of a forged badge matched.
///
/// # Examples
///
/// ```
/// use parkgate_core::BadgeId;
///
/// let badge: BadgeId = "1c:21:09:49".parse().unwrap();
/// assert_eq!(badge.as_str(), "1C:21:09:49");
/// assert_eq!(badge, BadgeId::from_uid(&[0x1C, 0x21, 0x09, 0x49]).unwrap());
/// ```
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BadgeId(String);

impl BadgeId {
    /// Parse and normalize a badge identifier.
    ///
    /// # Errors
    /// Returns `Error::InvalidBadgeId` if:
    /// - An octet is not exactly two hex digits
    /// - The number of octets is outside 4-10
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let octets: Vec<&str> = text.split(BADGE_SEPARATOR).collect();

        if !(MIN_BADGE_BYTES..=MAX_BADGE_BYTES).contains(&octets.len()) {
            return Err(Error::InvalidBadgeId(format!(
                "{text:?} has {} octets, expected {MIN_BADGE_BYTES}-{MAX_BADGE_BYTES}",
                octets.len()
            )));
        }

        let valid = octets
            .iter()
            .all(|octet| octet.len() == 2 && octet.bytes().all(|b| b.is_ascii_hexdigit()));
        if !valid {
            return Err(Error::InvalidBadgeId(format!(
                "{text:?} is not colon-separated hex"
            )));
        }

        Ok(BadgeId(text.to_ascii_uppercase()))
    }

    /// Build an identifier from the raw UID bytes reported by a reader.
    ///
    /// # Errors
    /// Returns `Error::InvalidBadgeId` if the UID length is outside 4-10 bytes.
    pub fn from_uid(uid: &[u8]) -> Result<Self> {
        if !(MIN_BADGE_BYTES..=MAX_BADGE_BYTES).contains(&uid.len()) {
            return Err(Error::InvalidBadgeId(format!(
                "UID of {} bytes, expected {MIN_BADGE_BYTES}-{MAX_BADGE_BYTES}",
                uid.len()
            )));
        }

        let rendered = uid
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(":");
        Ok(BadgeId(rendered))
    }

    /// Get the canonical identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for BadgeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        BadgeId::parse(s)
    }
}

impl TryFrom<String> for BadgeId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        BadgeId::parse(&value)
    }
}

impl From<BadgeId> for String {
    fn from(badge: BadgeId) -> Self {
        badge.0
    }
}

/// Constant-time comparison implementation for BadgeId
impl PartialEq for BadgeId {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::hash::Hash for BadgeId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// One-based parking slot number, as printed on the facility floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotNumber(usize);

impl SlotNumber {
    /// Create a slot number, checking it against the facility capacity.
    ///
    /// # Errors
    /// Returns `Error::InvalidSlot` if `number` is zero or above `capacity`.
    pub fn new(number: usize, capacity: usize) -> Result<Self> {
        if number == 0 || number > capacity {
            return Err(Error::InvalidSlot { number, capacity });
        }
        Ok(SlotNumber(number))
    }

    /// Slot number for a zero-based index into per-slot tables.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        SlotNumber(index + 1)
    }

    /// Zero-based index into per-slot tables.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0 - 1
    }

    #[must_use]
    pub fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotNumber {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two barriers of the facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarrierKind {
    Entry,
    Exit,
}

impl fmt::Display for BarrierKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BarrierKind::Entry => f.write_str("entry"),
            BarrierKind::Exit => f.write_str("exit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1C:21:09:49", "1C:21:09:49")]
    #[case("1c:21:09:49", "1C:21:09:49")]
    #[case("  43:23:7a:1a\n", "43:23:7A:1A")]
    #[case("04:A1:B2:C3:D4:E5:F6", "04:A1:B2:C3:D4:E5:F6")]
    fn test_badge_parse_normalizes(#[case] input: &str, #[case] expected: &str) {
        let badge = BadgeId::parse(input).unwrap();
        assert_eq!(badge.as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("1C:21:09")]
    #[case("1C:21:09:4")]
    #[case("1C:21:09:4G")]
    #[case("1C-21-09-49")]
    #[case("1C:21:09:49:00:00:00:00:00:00:00")]
    fn test_badge_parse_rejects_malformed(#[case] input: &str) {
        assert!(matches!(
            BadgeId::parse(input),
            Err(Error::InvalidBadgeId(_))
        ));
    }

    #[test]
    fn test_badge_from_uid_renders_uppercase_hex() {
        let badge = BadgeId::from_uid(&[0x43, 0x23, 0x7A, 0x1A]).unwrap();
        assert_eq!(badge.to_string(), "43:23:7A:1A");
    }

    #[test]
    fn test_badge_from_uid_rejects_short_uid() {
        assert!(BadgeId::from_uid(&[0x01, 0x02]).is_err());
    }

    #[test]
    fn test_badge_equality_ignores_input_case() {
        let lower = BadgeId::parse("1c:21:09:49").unwrap();
        let upper = BadgeId::parse("1C:21:09:49").unwrap();
        assert_eq!(lower, upper);
        assert_ne!(lower, BadgeId::parse("00:00:00:00").unwrap());
    }

    #[test]
    fn test_badge_serde_uses_string_form() {
        let badge = BadgeId::parse("1c:21:09:49").unwrap();
        let json = serde_json::to_string(&badge).unwrap();
        assert_eq!(json, "\"1C:21:09:49\"");

        let back: BadgeId = serde_json::from_str("\"43:23:7a:1a\"").unwrap();
        assert_eq!(back.as_str(), "43:23:7A:1A");

        assert!(serde_json::from_str::<BadgeId>("\"nope\"").is_err());
    }

    #[rstest]
    #[case(1, 2, true)]
    #[case(2, 2, true)]
    #[case(0, 2, false)]
    #[case(3, 2, false)]
    fn test_slot_number_bounds(#[case] number: usize, #[case] capacity: usize, #[case] ok: bool) {
        assert_eq!(SlotNumber::new(number, capacity).is_ok(), ok);
    }

    #[test]
    fn test_slot_number_index_round_trip() {
        let slot = SlotNumber::from_index(0);
        assert_eq!(slot.get(), 1);
        assert_eq!(slot.index(), 0);
        assert_eq!(slot.to_string(), "1");
    }
}

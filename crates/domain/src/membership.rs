//! Membership keys and the set difference that drives transition detection.
//!
//! A key is `(zone id, zone name)`. Because the name is part of the key,
//! renaming a zone yields one EXIT for the old key and one ENTER for the new
//! key on the next evaluation of every device inside it.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::id::ZoneId;
use crate::zone::Zone;

const SEPARATOR: char = '|';

/// The unit of zone membership for a device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MembershipKey {
    pub zone_id: ZoneId,
    pub zone_name: String,
}

impl MembershipKey {
    #[must_use]
    pub fn new(zone_id: ZoneId, zone_name: impl Into<String>) -> Self {
        Self {
            zone_id,
            zone_name: zone_name.into(),
        }
    }
}

impl From<&Zone> for MembershipKey {
    fn from(zone: &Zone) -> Self {
        Self::new(zone.id, zone.name.clone())
    }
}

/// Encoded as `<uuid>|<name>`.
impl fmt::Display for MembershipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.zone_id, self.zone_name)
    }
}

/// Why a stored key could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MembershipKeyError {
    #[error("missing separator")]
    MissingSeparator,
    #[error("invalid zone id")]
    InvalidZoneId,
}

impl FromStr for MembershipKey {
    type Err = MembershipKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, name) = s
            .split_once(SEPARATOR)
            .ok_or(MembershipKeyError::MissingSeparator)?;
        let zone_id = id
            .parse::<ZoneId>()
            .map_err(|_| MembershipKeyError::InvalidZoneId)?;
        Ok(Self::new(zone_id, name))
    }
}

/// Result of comparing the previous and current membership of a device.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MembershipDiff {
    /// Keys in `previous` but not in `current`, in `previous` order.
    pub exited: Vec<MembershipKey>,
    /// Keys in `current` but not in `previous`, in `current` order.
    pub entered: Vec<MembershipKey>,
}

impl MembershipDiff {
    /// Compute `previous \ current` and `current \ previous`.
    ///
    /// Duplicates on either side are collapsed; the first occurrence wins.
    #[must_use]
    pub fn between(previous: &[MembershipKey], current: &[MembershipKey]) -> Self {
        let previous_set: HashSet<&MembershipKey> = previous.iter().collect();
        let current_set: HashSet<&MembershipKey> = current.iter().collect();

        let mut seen = HashSet::new();
        let exited = previous
            .iter()
            .filter(|key| !current_set.contains(key) && seen.insert(*key))
            .cloned()
            .collect();

        let mut seen = HashSet::new();
        let entered = current
            .iter()
            .filter(|key| !previous_set.contains(key) && seen.insert(*key))
            .cloned()
            .collect();

        Self { exited, entered }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exited.is_empty() && self.entered.is_empty()
    }
}

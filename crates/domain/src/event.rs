//! Geofence event — an immutable record of a device crossing a zone boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::ZoneId;
use crate::membership::MembershipKey;
use crate::time::{Timestamp, now};

/// Direction of a zone transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Transition {
    Enter,
    Exit,
}

impl Transition {
    /// Wire/storage representation (`ENTER` / `EXIT`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enter => "ENTER",
            Self::Exit => "EXIT",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected zone transition for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceEvent {
    pub device_id: String,
    pub zone_id: ZoneId,
    pub zone_name: String,
    pub transition: Transition,
    pub timestamp: Timestamp,
}

impl GeofenceEvent {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(device_id: impl Into<String>, key: &MembershipKey, transition: Transition) -> Self {
        Self {
            device_id: device_id.into(),
            zone_id: key.zone_id,
            zone_name: key.zone_name.clone(),
            transition,
            timestamp: now(),
        }
    }
}

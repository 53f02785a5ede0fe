//! Broadcast messages — the schema pushed to every live subscriber.
//!
//! ```json
//! {"type":"LOCATION_UPDATE","device_id":"truck-1","latitude":19.4,"longitude":-99.1,"heading":90.0}
//! {"type":"GEOFENCE_EVENT","device_id":"truck-1","zone_name":"Depot","event":"ENTER","timestamp":"2024-05-01T12:00:00Z"}
//! ```
//!
//! Values can only be built from already validated domain types.

use std::sync::Arc;

use serde::Serialize;

use crate::event::{GeofenceEvent, Transition};
use crate::location::LocationFix;
use crate::time::Timestamp;

/// A serialized message shared by every subscriber of one broadcast.
pub type Payload = Arc<str>;

/// Message fanned out by the broadcast hub.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BroadcastMessage {
    LocationUpdate {
        device_id: String,
        latitude: f64,
        longitude: f64,
        heading: f64,
    },
    GeofenceEvent {
        device_id: String,
        zone_name: String,
        event: Transition,
        timestamp: Timestamp,
    },
}

impl BroadcastMessage {
    /// Position update for a stored fix. A missing heading is sent as `0`.
    #[must_use]
    pub fn location_update(fix: &LocationFix) -> Self {
        Self::LocationUpdate {
            device_id: fix.device_id.clone(),
            latitude: fix.latitude,
            longitude: fix.longitude,
            heading: fix.heading.unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn geofence_event(event: &GeofenceEvent) -> Self {
        Self::GeofenceEvent {
            device_id: event.device_id.clone(),
            zone_name: event.zone_name.clone(),
            event: event.transition,
            timestamp: event.timestamp,
        }
    }

    /// Serialize once into a shareable payload.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if encoding fails.
    pub fn encode(&self) -> Result<Payload, serde_json::Error> {
        serde_json::to_string(self).map(Payload::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ZoneId;
    use crate::membership::MembershipKey;

    #[test]
    fn should_encode_location_update_with_exact_fields() {
        let fix = LocationFix::builder()
            .device_id("truck-1")
            .position(19.5, -99.25)
            .heading(Some(180.0))
            .build()
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&BroadcastMessage::location_update(&fix).encode().unwrap())
                .unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "type": "LOCATION_UPDATE",
                "device_id": "truck-1",
                "latitude": 19.5,
                "longitude": -99.25,
                "heading": 180.0
            })
        );
    }

    #[test]
    fn should_default_missing_heading_to_zero() {
        let fix = LocationFix::builder()
            .device_id("truck-1")
            .position(1.0, 2.0)
            .build()
            .unwrap();
        let BroadcastMessage::LocationUpdate { heading, .. } =
            BroadcastMessage::location_update(&fix)
        else {
            panic!("expected a location update");
        };
        assert!(heading.abs() < f64::EPSILON);
    }

    #[test]
    fn should_encode_geofence_event_with_exact_fields() {
        let key = MembershipKey::new(ZoneId::new(), "Depot");
        let event = GeofenceEvent::new("truck-1", &key, Transition::Enter);

        let value: serde_json::Value =
            serde_json::from_str(&BroadcastMessage::geofence_event(&event).encode().unwrap())
                .unwrap();

        assert_eq!(value["type"], "GEOFENCE_EVENT");
        assert_eq!(value["device_id"], "truck-1");
        assert_eq!(value["zone_name"], "Depot");
        assert_eq!(value["event"], "ENTER");
        let timestamp = value["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
        assert_eq!(value.as_object().unwrap().len(), 5);
    }
}

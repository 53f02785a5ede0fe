//! Evaluation trigger port — start a geofence evaluation without waiting.

use geofence_domain::location::Point;

/// Starts a detached geofence evaluation for one device.
///
/// Implementations must return immediately; the outcome of the evaluation
/// never reaches the caller.
pub trait GeofenceTrigger: Send + Sync {
    fn trigger(&self, device_id: &str, point: Point);
}

//! Event log port — append-only audit of geofence transitions.

use std::future::Future;
use std::sync::Arc;

use geofence_domain::error::GeofenceError;
use geofence_domain::event::GeofenceEvent;

/// Append-only sink for [`GeofenceEvent`]s.
pub trait GeofenceEventLog {
    /// Append one event. Callers treat failures as best-effort.
    fn record(
        &self,
        event: GeofenceEvent,
    ) -> impl Future<Output = Result<(), GeofenceError>> + Send;
}

impl<T: GeofenceEventLog + Send + Sync> GeofenceEventLog for Arc<T> {
    fn record(
        &self,
        event: GeofenceEvent,
    ) -> impl Future<Output = Result<(), GeofenceError>> + Send {
        (**self).record(event)
    }
}

//! `PostgreSQL` implementation of [`GeofenceEventLog`].

use sqlx::PgPool;

use geofence_app::ports::GeofenceEventLog;
use geofence_domain::error::GeofenceError;
use geofence_domain::event::GeofenceEvent;

use crate::error::StorageError;

const INSERT: &str = r"
    INSERT INTO geofence_events (device_id, geofence_id, zone_name, event_type, occurred_at)
    VALUES ($1, $2, $3, $4, $5)
";

/// Append-only audit table of geofence transitions.
#[derive(Clone)]
pub struct PgGeofenceEventLog {
    pool: PgPool,
}

impl PgGeofenceEventLog {
    /// Create a new event log using the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl GeofenceEventLog for PgGeofenceEventLog {
    async fn record(&self, event: GeofenceEvent) -> Result<(), GeofenceError> {
        sqlx::query(INSERT)
            .bind(&event.device_id)
            .bind(event.zone_id.as_uuid())
            .bind(&event.zone_name)
            .bind(event.transition.as_str())
            .bind(event.timestamp)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::test_database;
    use geofence_domain::event::Transition;
    use geofence_domain::id::ZoneId;
    use geofence_domain::membership::MembershipKey;

    #[tokio::test]
    #[ignore = "requires a PostGIS database"]
    async fn should_append_event() {
        let db = test_database().await;
        let log = PgGeofenceEventLog::new(db.pool().clone());
        let device_id = format!("test-{}", uuid::Uuid::new_v4());
        let key = MembershipKey::new(ZoneId::new(), "Depot");

        log.record(GeofenceEvent::new(device_id.as_str(), &key, Transition::Enter))
            .await
            .unwrap();
        log.record(GeofenceEvent::new(device_id.as_str(), &key, Transition::Exit))
            .await
            .unwrap();

        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT zone_name, event_type FROM geofence_events WHERE device_id = $1 ORDER BY id",
        )
        .bind(&device_id)
        .fetch_all(db.pool())
        .await
        .unwrap();

        assert_eq!(
            rows,
            vec![
                ("Depot".to_string(), "ENTER".to_string()),
                ("Depot".to_string(), "EXIT".to_string())
            ]
        );
    }
}

//! Redis set implementation of [`MembershipSnapshotStore`].

use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use geofence_app::ports::MembershipSnapshotStore;
use geofence_domain::error::GeofenceError;

use crate::error::CacheError;

const KEY_PREFIX: &str = "device:zones:";

fn snapshot_key(device_id: &str) -> String {
    format!("{KEY_PREFIX}{device_id}")
}

/// Redis `EXPIRE` takes whole seconds; never round a positive TTL down to 0.
fn ttl_seconds(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs().max(1)).unwrap_or(i64::MAX)
}

/// Redis-backed membership snapshots, one set per device.
#[derive(Clone)]
pub struct RedisSnapshotStore {
    conn: ConnectionManager,
}

impl RedisSnapshotStore {
    #[must_use]
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

impl MembershipSnapshotStore for RedisSnapshotStore {
    async fn load(&self, device_id: &str) -> Result<Vec<String>, GeofenceError> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn
            .smembers(snapshot_key(device_id))
            .await
            .map_err(CacheError::from)?;
        Ok(members)
    }

    async fn replace(
        &self,
        device_id: &str,
        members: &[String],
        ttl: Duration,
    ) -> Result<(), GeofenceError> {
        let key = snapshot_key(device_id);
        let mut pipe = redis::pipe();
        pipe.atomic().del(&key).ignore();
        if !members.is_empty() {
            pipe.sadd(&key, members)
                .ignore()
                .expire(&key, ttl_seconds(ttl))
                .ignore();
        }

        let mut conn = self.conn.clone();
        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }
}

//! `PostGIS` implementation of [`LocationRepository`].

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};

use geofence_app::ports::LocationRepository;
use geofence_domain::error::GeofenceError;
use geofence_domain::id::LocationId;
use geofence_domain::location::LocationFix;
use geofence_domain::nearby::{NearbyDevice, RadiusQuery};

use crate::error::StorageError;

/// Wrapper for converting database rows into domain [`LocationFix`].
struct Wrapper(LocationFix);

impl<'r> FromRow<'r, PgRow> for Wrapper {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self(LocationFix {
            device_id: row.try_get("device_id")?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            speed: row.try_get("speed")?,
            heading: row.try_get("heading")?,
            accuracy: row.try_get("accuracy")?,
            recorded_at: row.try_get("recorded_at")?,
        }))
    }
}

struct NearbyWrapper(NearbyDevice);

impl<'r> FromRow<'r, PgRow> for NearbyWrapper {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self(NearbyDevice {
            device_id: row.try_get("device_id")?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            distance: row.try_get("distance")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO locations (id, device_id, latitude, longitude, speed, heading, accuracy, recorded_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    RETURNING id
";

// Devices with any fix inside the radius (GIST index), then each
// candidate's latest fix (device/time index), kept only if still inside.
const SELECT_NEARBY: &str = r"
    WITH candidates AS (
        SELECT DISTINCT device_id
        FROM locations
        WHERE ST_DWithin(geom, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $3)
    )
    SELECT latest.device_id, latest.latitude, latest.longitude,
           ST_Distance(latest.geom, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography) AS distance
    FROM candidates
    CROSS JOIN LATERAL (
        SELECT device_id, latitude, longitude, geom
        FROM locations
        WHERE locations.device_id = candidates.device_id
        ORDER BY recorded_at DESC
        LIMIT 1
    ) latest
    WHERE ST_DWithin(latest.geom, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $3)
    ORDER BY distance
";

const SELECT_BY_DEVICE: &str = r"
    SELECT device_id, latitude, longitude, speed, heading, accuracy, recorded_at
    FROM locations
    WHERE device_id = $1
    ORDER BY recorded_at DESC
    LIMIT $2
";

/// `PostGIS`-backed location repository.
#[derive(Clone)]
pub struct PgLocationRepository {
    pool: PgPool,
}

impl PgLocationRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl LocationRepository for PgLocationRepository {
    async fn create(&self, fix: &LocationFix) -> Result<LocationId, GeofenceError> {
        let id: uuid::Uuid = sqlx::query_scalar(INSERT)
            .bind(LocationId::new().as_uuid())
            .bind(&fix.device_id)
            .bind(fix.latitude)
            .bind(fix.longitude)
            .bind(fix.speed)
            .bind(fix.heading)
            .bind(fix.accuracy)
            .bind(fix.recorded_at)
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(LocationId::from_uuid(id))
    }

    async fn find_nearby(&self, query: RadiusQuery) -> Result<Vec<NearbyDevice>, GeofenceError> {
        let rows: Vec<NearbyWrapper> = sqlx::query_as(SELECT_NEARBY)
            .bind(query.center.longitude())
            .bind(query.center.latitude())
            .bind(query.radius_m)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn find_by_device(
        &self,
        device_id: &str,
        limit: usize,
    ) -> Result<Vec<LocationFix>, GeofenceError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_DEVICE)
            .bind(device_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}

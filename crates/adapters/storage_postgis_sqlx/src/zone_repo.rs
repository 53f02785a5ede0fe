//! `PostGIS` implementation of [`ZoneRepository`].
//!
//! Geometries travel as `GeoJSON` text in both directions; containment is
//! answered by `ST_Contains`.

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};

use geofence_app::ports::ZoneRepository;
use geofence_domain::error::GeofenceError;
use geofence_domain::id::ZoneId;
use geofence_domain::location::Point;
use geofence_domain::zone::Zone;

use crate::error::StorageError;

/// Wrapper for converting database rows into domain [`Zone`].
struct Wrapper(Zone);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Zone> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, PgRow> for Wrapper {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let geometry: String = row.try_get("geometry")?;

        let geometry: serde_json::Value =
            serde_json::from_str(&geometry).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(Zone {
            id: ZoneId::from_uuid(id),
            name,
            geometry,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO geofences (id, name, geom)
    VALUES ($1, $2, ST_SetSRID(ST_GeomFromGeoJSON($3), 4326))
";

const UPDATE: &str = r"
    UPDATE geofences
    SET name = $2, geom = ST_SetSRID(ST_GeomFromGeoJSON($3), 4326)
    WHERE id = $1
    RETURNING id, name, ST_AsGeoJSON(geom) AS geometry
";

const DELETE_BY_ID: &str = "DELETE FROM geofences WHERE id = $1";

const SELECT_ALL: &str =
    "SELECT id, name, ST_AsGeoJSON(geom) AS geometry FROM geofences ORDER BY name";

const SELECT_BY_ID: &str =
    "SELECT id, name, ST_AsGeoJSON(geom) AS geometry FROM geofences WHERE id = $1";

const SELECT_CONTAINING: &str = r"
    SELECT id, name, ST_AsGeoJSON(geom) AS geometry
    FROM geofences
    WHERE ST_Contains(geom, ST_SetSRID(ST_MakePoint($1, $2), 4326))
    ORDER BY name
";

/// `PostGIS`-backed zone repository.
#[derive(Clone)]
pub struct PgZoneRepository {
    pool: PgPool,
}

impl PgZoneRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ZoneRepository for PgZoneRepository {
    async fn find_containing(&self, point: Point) -> Result<Vec<Zone>, GeofenceError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_CONTAINING)
            .bind(point.longitude())
            .bind(point.latitude())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn get_all(&self) -> Result<Vec<Zone>, GeofenceError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn get_by_id(&self, id: ZoneId) -> Result<Option<Zone>, GeofenceError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn create(&self, zone: Zone) -> Result<Zone, GeofenceError> {
        let geometry = serde_json::to_string(&zone.geometry).map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(zone.id.as_uuid())
            .bind(&zone.name)
            .bind(&geometry)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(zone)
    }

    async fn update(&self, zone: Zone) -> Result<Option<Zone>, GeofenceError> {
        let geometry = serde_json::to_string(&zone.geometry).map_err(StorageError::from)?;

        let row: Option<Wrapper> = sqlx::query_as(UPDATE)
            .bind(zone.id.as_uuid())
            .bind(&zone.name)
            .bind(&geometry)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }

    async fn delete(&self, id: ZoneId) -> Result<(), GeofenceError> {
        sqlx::query(DELETE_BY_ID)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}

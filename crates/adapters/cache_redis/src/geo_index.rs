//! Redis GEO implementation of [`GeoIndex`].

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use redis::geo::{Coord, RadiusOptions, RadiusOrder, RadiusSearchResult, Unit};

use geofence_app::ports::GeoIndex;
use geofence_domain::error::GeofenceError;
use geofence_domain::location::Point;
use geofence_domain::nearby::{NearbyDevice, RadiusQuery};

use crate::error::CacheError;

/// Sorted set holding the last known position of every device.
pub const LOCATIONS_KEY: &str = "devices:locations";

/// Redis-backed geo index.
#[derive(Clone)]
pub struct RedisGeoIndex {
    conn: ConnectionManager,
    key: String,
}

impl RedisGeoIndex {
    #[must_use]
    pub fn new(conn: ConnectionManager) -> Self {
        Self::with_key(conn, LOCATIONS_KEY)
    }

    /// Use a custom GEO key instead of [`LOCATIONS_KEY`].
    #[must_use]
    pub fn with_key(conn: ConnectionManager, key: impl Into<String>) -> Self {
        Self {
            conn,
            key: key.into(),
        }
    }
}

fn to_nearby(result: RadiusSearchResult) -> Option<NearbyDevice> {
    let coord = result.coord?;
    Some(NearbyDevice {
        device_id: result.name,
        latitude: coord.latitude,
        longitude: coord.longitude,
        distance: result.dist,
    })
}

impl GeoIndex for RedisGeoIndex {
    async fn upsert_position(&self, device_id: &str, point: Point) -> Result<(), GeofenceError> {
        let mut conn = self.conn.clone();
        let member = (Coord::lon_lat(point.longitude(), point.latitude()), device_id);
        let _: usize = conn
            .geo_add(&self.key, member)
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }

    async fn search_radius(&self, query: RadiusQuery) -> Result<Vec<NearbyDevice>, GeofenceError> {
        let mut conn = self.conn.clone();
        let options = RadiusOptions::default()
            .with_coord()
            .with_dist()
            .order(RadiusOrder::Asc);
        let results: Vec<RadiusSearchResult> = conn
            .geo_radius(
                &self.key,
                query.center.longitude(),
                query.center.latitude(),
                query.radius_m,
                Unit::Meters,
                options,
            )
            .await
            .map_err(CacheError::from)?;

        Ok(results.into_iter().filter_map(to_nearby).collect())
    }
}

//! Geospatial cache-aside layer.
//!
//! Proximity queries hit the fast geo index first and fall back to the
//! canonical store when the index has nothing (or is unavailable). The
//! fallback never repopulates the index; the only writes are the best-effort
//! upserts done on every ingest, so results may be stale.

use geofence_domain::error::{DegradedError, GeofenceError};
use geofence_domain::location::Point;
use geofence_domain::nearby::{NearbyDevice, NearbySource, RadiusQuery};

use crate::ports::{GeoIndex, LocationRepository};

/// Devices found by a proximity query and where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyResult {
    pub source: NearbySource,
    pub devices: Vec<NearbyDevice>,
}

/// Read-through wrapper over a [`GeoIndex`] and a [`LocationRepository`].
pub struct GeoCache<G, L> {
    index: G,
    store: L,
}

impl<G: GeoIndex, L: LocationRepository> GeoCache<G, L> {
    pub fn new(index: G, store: L) -> Self {
        Self { index, store }
    }

    /// Overwrite the indexed position of a device. Failures are logged only.
    pub async fn upsert_position(&self, device_id: &str, point: Point) {
        if let Err(err) = self.index.upsert_position(device_id, point).await {
            let err = DegradedError::unavailable("geo index", err);
            tracing::warn!(device_id, %err, "failed to update cached position");
        }
    }

    /// Devices within `radius_m` metres of (`latitude`, `longitude`).
    ///
    /// # Errors
    ///
    /// Returns [`GeofenceError::Validation`] for an invalid query, or the
    /// store error when the fallback query fails.
    pub async fn nearby(
        &self,
        latitude: f64,
        longitude: f64,
        radius_m: f64,
    ) -> Result<NearbyResult, GeofenceError> {
        let query = RadiusQuery::new(latitude, longitude, radius_m)?;

        match self.index.search_radius(query).await {
            Ok(devices) if !devices.is_empty() => {
                return Ok(NearbyResult {
                    source: NearbySource::Cache,
                    devices,
                });
            }
            Ok(_) => tracing::debug!(radius_m, "geo index miss, querying store"),
            Err(err) => {
                let err = DegradedError::unavailable("geo index", err);
                tracing::warn!(%err, "geo index search failed, querying store");
            }
        }

        let devices = self.store.find_nearby(query).await?;
        Ok(NearbyResult {
            source: NearbySource::Store,
            devices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geofence_domain::error::ValidationError;
    use geofence_domain::id::LocationId;
    use geofence_domain::location::LocationFix;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubIndex {
        hits: Vec<NearbyDevice>,
        failing: bool,
        upserts: Mutex<Vec<(String, Point)>>,
        searches: Mutex<usize>,
    }

    impl GeoIndex for StubIndex {
        async fn upsert_position(&self, device_id: &str, point: Point) -> Result<(), GeofenceError> {
            if self.failing {
                return Err(GeofenceError::dependency(std::io::Error::other("down")));
            }
            self.upserts
                .lock()
                .unwrap()
                .push((device_id.to_string(), point));
            Ok(())
        }

        async fn search_radius(
            &self,
            _query: RadiusQuery,
        ) -> Result<Vec<NearbyDevice>, GeofenceError> {
            *self.searches.lock().unwrap() += 1;
            if self.failing {
                return Err(GeofenceError::dependency(std::io::Error::other("down")));
            }
            Ok(self.hits.clone())
        }
    }

    #[derive(Default)]
    struct StubStore {
        rows: Vec<NearbyDevice>,
        failing: bool,
        queries: Mutex<Vec<RadiusQuery>>,
    }

    impl LocationRepository for StubStore {
        async fn create(&self, _fix: &LocationFix) -> Result<LocationId, GeofenceError> {
            Ok(LocationId::new())
        }

        async fn find_nearby(&self, query: RadiusQuery) -> Result<Vec<NearbyDevice>, GeofenceError> {
            self.queries.lock().unwrap().push(query);
            if self.failing {
                return Err(GeofenceError::dependency(std::io::Error::other("db down")));
            }
            Ok(self.rows.clone())
        }

        async fn find_by_device(
            &self,
            _device_id: &str,
            _limit: usize,
        ) -> Result<Vec<LocationFix>, GeofenceError> {
            Ok(vec![])
        }
    }

    fn device(id: &str) -> NearbyDevice {
        NearbyDevice {
            device_id: id.to_string(),
            latitude: 19.4,
            longitude: -99.1,
            distance: Some(12.5),
        }
    }

    #[tokio::test]
    async fn should_answer_from_cache_when_index_has_results() {
        let index = StubIndex {
            hits: vec![device("cached")],
            ..StubIndex::default()
        };
        let cache = GeoCache::new(index, StubStore::default());

        let result = cache.nearby(19.4, -99.1, 500.0).await.unwrap();

        assert_eq!(result.source, NearbySource::Cache);
        assert_eq!(result.devices, vec![device("cached")]);
        assert!(cache.store.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_fall_back_to_store_on_cache_miss() {
        let store = StubStore {
            rows: vec![device("stored")],
            ..StubStore::default()
        };
        let cache = GeoCache::new(StubIndex::default(), store);

        let result = cache.nearby(19.4, -99.1, 500.0).await.unwrap();

        assert_eq!(result.source, NearbySource::Store);
        assert_eq!(result.devices, vec![device("stored")]);
        assert_eq!(cache.store.queries.lock().unwrap().len(), 1);
        assert!(cache.index.upserts.lock().unwrap().is_empty(), "no repopulation");
    }

    #[tokio::test]
    async fn should_fall_back_to_store_when_index_fails() {
        let index = StubIndex {
            failing: true,
            ..StubIndex::default()
        };
        let store = StubStore {
            rows: vec![device("stored")],
            ..StubStore::default()
        };
        let cache = GeoCache::new(index, store);

        let result = cache.nearby(19.4, -99.1, 500.0).await.unwrap();
        assert_eq!(result.source, NearbySource::Store);
    }

    #[tokio::test]
    async fn should_report_store_tag_with_empty_results() {
        let cache = GeoCache::new(StubIndex::default(), StubStore::default());
        let result = cache.nearby(0.0, 0.0, 10.0).await.unwrap();
        assert_eq!(result.source, NearbySource::Store);
        assert!(result.devices.is_empty());
    }

    #[tokio::test]
    async fn should_propagate_store_failure() {
        let store = StubStore {
            failing: true,
            ..StubStore::default()
        };
        let cache = GeoCache::new(StubIndex::default(), store);
        let result = cache.nearby(0.0, 0.0, 10.0).await;
        assert!(matches!(result, Err(GeofenceError::Dependency(_))));
    }

    #[tokio::test]
    async fn should_reject_invalid_query_before_touching_backends() {
        let cache = GeoCache::new(StubIndex::default(), StubStore::default());

        let result = cache.nearby(0.0, 0.0, -5.0).await;

        assert!(matches!(
            result,
            Err(GeofenceError::Validation(ValidationError::InvalidRadius(_)))
        ));
        assert_eq!(*cache.index.searches.lock().unwrap(), 0);
        assert!(cache.store.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_swallow_upsert_failures() {
        let index = StubIndex {
            failing: true,
            ..StubIndex::default()
        };
        let cache = GeoCache::new(index, StubStore::default());
        cache
            .upsert_position("truck-1", Point::new(1.0, 2.0).unwrap())
            .await;
    }
}

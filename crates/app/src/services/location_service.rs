//! Location ingest coordinator and location queries.

use std::sync::Arc;

use geofence_domain::error::{GeofenceError, ValidationError};
use geofence_domain::id::LocationId;
use geofence_domain::location::{
    DEFAULT_TRACK_LIMIT, LineString, LocationFix, validate_track_limit,
};
use geofence_domain::message::BroadcastMessage;

use super::geo_cache::{GeoCache, NearbyResult};
use crate::ports::{BroadcastPublisher, GeoIndex, GeofenceTrigger, LocationRepository};

/// Entry point for incoming position reports.
pub struct LocationService<L, G, P, T> {
    locations: L,
    geo_cache: Arc<GeoCache<G, L>>,
    publisher: P,
    trigger: T,
}

impl<L, G, P, T> LocationService<L, G, P, T>
where
    L: LocationRepository + Sync,
    G: GeoIndex + Sync,
    P: BroadcastPublisher + Sync,
    T: GeofenceTrigger,
{
    pub fn new(locations: L, geo_cache: Arc<GeoCache<G, L>>, publisher: P, trigger: T) -> Self {
        Self {
            locations,
            geo_cache,
            publisher,
            trigger,
        }
    }

    /// Validate and record a fix, returning the id assigned by the store.
    ///
    /// The geofence evaluation is started before the fix is persisted and
    /// runs detached. Only the durable write can fail the call; cache and
    /// broadcast failures are logged.
    ///
    /// # Errors
    ///
    /// Returns [`GeofenceError::Validation`] without any side effect when the
    /// fix is invalid, or the store error when persisting fails.
    pub async fn ingest(&self, fix: LocationFix) -> Result<LocationId, GeofenceError> {
        fix.validate()?;
        let point = fix.point()?;

        self.trigger.trigger(&fix.device_id, point);

        let id = self.locations.create(&fix).await.inspect_err(|err| {
            tracing::error!(device_id = %fix.device_id, error = %err, "failed to persist location");
        })?;

        self.geo_cache.upsert_position(&fix.device_id, point).await;

        if let Err(err) = self
            .publisher
            .publish(BroadcastMessage::location_update(&fix))
            .await
        {
            tracing::warn!(device_id = %fix.device_id, error = %err, "failed to broadcast location update");
        }

        tracing::debug!(device_id = %fix.device_id, location_id = %id, "location ingested");
        Ok(id)
    }

    /// Devices near a point, answered by the cache when possible.
    ///
    /// # Errors
    ///
    /// See [`GeoCache::nearby`].
    pub async fn nearby(
        &self,
        latitude: f64,
        longitude: f64,
        radius_m: f64,
    ) -> Result<NearbyResult, GeofenceError> {
        self.geo_cache.nearby(latitude, longitude, radius_m).await
    }

    /// Most recent fixes of a device, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GeofenceError::Validation`] for an empty device id or a
    /// limit outside `1..=1000`, or the store error.
    pub async fn track(
        &self,
        device_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<LocationFix>, GeofenceError> {
        if device_id.trim().is_empty() {
            return Err(ValidationError::EmptyDeviceId.into());
        }
        let limit = validate_track_limit(limit.unwrap_or(DEFAULT_TRACK_LIMIT))?;
        self.locations.find_by_device(device_id, limit).await
    }

    /// The same fixes as [`LocationService::track`] as a `GeoJSON` line,
    /// oldest first. A device without fixes yields an empty line.
    ///
    /// # Errors
    ///
    /// See [`LocationService::track`].
    pub async fn route(
        &self,
        device_id: &str,
        limit: Option<usize>,
    ) -> Result<LineString, GeofenceError> {
        let track = self.track(device_id, limit).await?;
        Ok(LineString::from_track(&track))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geofence_domain::location::Point;
    use geofence_domain::nearby::{NearbyDevice, NearbySource, RadiusQuery};
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryLocations {
        fixes: Mutex<Vec<(LocationId, LocationFix)>>,
        failing: bool,
    }

    impl LocationRepository for InMemoryLocations {
        async fn create(&self, fix: &LocationFix) -> Result<LocationId, GeofenceError> {
            if self.failing {
                return Err(GeofenceError::dependency(std::io::Error::other("db down")));
            }
            let id = LocationId::new();
            self.fixes.lock().unwrap().push((id, fix.clone()));
            Ok(id)
        }

        async fn find_nearby(
            &self,
            _query: RadiusQuery,
        ) -> Result<Vec<NearbyDevice>, GeofenceError> {
            Ok(vec![])
        }

        async fn find_by_device(
            &self,
            device_id: &str,
            limit: usize,
        ) -> Result<Vec<LocationFix>, GeofenceError> {
            Ok(self
                .fixes
                .lock()
                .unwrap()
                .iter()
                .rev()
                .filter(|(_, fix)| fix.device_id == device_id)
                .take(limit)
                .map(|(_, fix)| fix.clone())
                .collect())
        }
    }

    #[derive(Default)]
    struct InMemoryIndex {
        positions: Mutex<Vec<(String, Point)>>,
        failing: bool,
    }

    impl GeoIndex for InMemoryIndex {
        async fn upsert_position(&self, device_id: &str, point: Point) -> Result<(), GeofenceError> {
            if self.failing {
                return Err(GeofenceError::dependency(std::io::Error::other("redis down")));
            }
            self.positions
                .lock()
                .unwrap()
                .push((device_id.to_string(), point));
            Ok(())
        }

        async fn search_radius(
            &self,
            _query: RadiusQuery,
        ) -> Result<Vec<NearbyDevice>, GeofenceError> {
            Ok(self
                .positions
                .lock()
                .unwrap()
                .iter()
                .map(|(device_id, point)| NearbyDevice {
                    device_id: device_id.clone(),
                    latitude: point.latitude(),
                    longitude: point.longitude(),
                    distance: Some(0.0),
                })
                .collect())
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        messages: Mutex<Vec<BroadcastMessage>>,
        failing: bool,
    }

    impl BroadcastPublisher for RecordingPublisher {
        async fn publish(&self, message: BroadcastMessage) -> Result<(), GeofenceError> {
            if self.failing {
                return Err(geofence_domain::error::DegradedError::HubSaturated.into());
            }
            self.messages.lock().unwrap().push(message);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingTrigger {
        calls: Mutex<Vec<String>>,
    }

    impl GeofenceTrigger for Arc<RecordingTrigger> {
        fn trigger(&self, device_id: &str, _point: Point) {
            self.calls.lock().unwrap().push(device_id.to_string());
        }
    }

    type TestService = LocationService<
        Arc<InMemoryLocations>,
        Arc<InMemoryIndex>,
        Arc<RecordingPublisher>,
        Arc<RecordingTrigger>,
    >;

    struct Harness {
        service: TestService,
        locations: Arc<InMemoryLocations>,
        index: Arc<InMemoryIndex>,
        publisher: Arc<RecordingPublisher>,
        trigger: Arc<RecordingTrigger>,
    }

    fn harness(
        locations: InMemoryLocations,
        index: InMemoryIndex,
        publisher: RecordingPublisher,
    ) -> Harness {
        let locations = Arc::new(locations);
        let index = Arc::new(index);
        let publisher = Arc::new(publisher);
        let trigger = Arc::new(RecordingTrigger::default());
        let geo_cache = Arc::new(GeoCache::new(Arc::clone(&index), Arc::clone(&locations)));
        let service = LocationService::new(
            Arc::clone(&locations),
            geo_cache,
            Arc::clone(&publisher),
            Arc::clone(&trigger),
        );
        Harness {
            service,
            locations,
            index,
            publisher,
            trigger,
        }
    }

    fn default_harness() -> Harness {
        harness(
            InMemoryLocations::default(),
            InMemoryIndex::default(),
            RecordingPublisher::default(),
        )
    }

    fn fix(device_id: &str, latitude: f64, longitude: f64) -> LocationFix {
        LocationFix::builder()
            .device_id(device_id)
            .position(latitude, longitude)
            .heading(Some(90.0))
            .build_unchecked()
    }

    #[tokio::test]
    async fn should_ingest_valid_fix() {
        let h = default_harness();

        let id = h.service.ingest(fix("truck-1", 19.4, -99.1)).await.unwrap();

        let stored = h.locations.fixes.lock().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].0, id);
        assert_eq!(*h.trigger.calls.lock().unwrap(), vec!["truck-1".to_string()]);
        assert_eq!(h.index.positions.lock().unwrap().len(), 1);
        assert_eq!(
            *h.publisher.messages.lock().unwrap(),
            vec![BroadcastMessage::LocationUpdate {
                device_id: "truck-1".to_string(),
                latitude: 19.4,
                longitude: -99.1,
                heading: 90.0,
            }]
        );
    }

    #[tokio::test]
    async fn should_reject_invalid_fix_without_side_effects() {
        let h = default_harness();

        let result = h.service.ingest(fix("truck-1", 91.0, 0.0)).await;

        assert!(matches!(
            result,
            Err(GeofenceError::Validation(ValidationError::LatitudeOutOfRange(_)))
        ));
        assert!(h.locations.fixes.lock().unwrap().is_empty());
        assert!(h.index.positions.lock().unwrap().is_empty());
        assert!(h.publisher.messages.lock().unwrap().is_empty());
        assert!(h.trigger.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_reject_empty_device_id() {
        let h = default_harness();
        let result = h.service.ingest(fix("", 0.0, 0.0)).await;
        assert!(matches!(
            result,
            Err(GeofenceError::Validation(ValidationError::EmptyDeviceId))
        ));
    }

    #[tokio::test]
    async fn should_fail_when_store_fails() {
        let h = harness(
            InMemoryLocations {
                failing: true,
                ..InMemoryLocations::default()
            },
            InMemoryIndex::default(),
            RecordingPublisher::default(),
        );

        let result = h.service.ingest(fix("truck-1", 1.0, 1.0)).await;

        assert!(matches!(result, Err(GeofenceError::Dependency(_))));
        assert!(h.publisher.messages.lock().unwrap().is_empty());
        // evaluation was already started
        assert_eq!(h.trigger.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_succeed_when_cache_and_broadcast_fail() {
        let h = harness(
            InMemoryLocations::default(),
            InMemoryIndex {
                failing: true,
                ..InMemoryIndex::default()
            },
            RecordingPublisher {
                failing: true,
                ..RecordingPublisher::default()
            },
        );

        let result = h.service.ingest(fix("truck-1", 1.0, 1.0)).await;

        assert!(result.is_ok());
        assert_eq!(h.locations.fixes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_serve_nearby_from_cache_after_ingest() {
        let h = default_harness();
        h.service.ingest(fix("truck-1", 1.0, 1.0)).await.unwrap();

        let result = h.service.nearby(1.0, 1.0, 100.0).await.unwrap();

        assert_eq!(result.source, NearbySource::Cache);
        assert_eq!(result.devices[0].device_id, "truck-1");
    }

    #[tokio::test]
    async fn should_return_track_newest_first() {
        let h = default_harness();
        for latitude in [1.0, 2.0, 3.0] {
            h.service.ingest(fix("truck-1", latitude, 0.0)).await.unwrap();
        }
        h.service.ingest(fix("truck-2", 9.0, 0.0)).await.unwrap();

        let track = h.service.track("truck-1", Some(2)).await.unwrap();

        let latitudes: Vec<f64> = track.iter().map(|fix| fix.latitude).collect();
        assert_eq!(latitudes, vec![3.0, 2.0]);
    }

    #[tokio::test]
    async fn should_default_track_limit() {
        let h = default_harness();
        h.service.ingest(fix("truck-1", 1.0, 0.0)).await.unwrap();
        let track = h.service.track("truck-1", None).await.unwrap();
        assert_eq!(track.len(), 1);
    }

    #[tokio::test]
    async fn should_reject_out_of_range_track_limit() {
        let h = default_harness();
        for limit in [0, 1001] {
            let result = h.service.track("truck-1", Some(limit)).await;
            assert!(matches!(
                result,
                Err(GeofenceError::Validation(ValidationError::InvalidLimit(_)))
            ));
        }
    }

    #[tokio::test]
    async fn should_return_route_oldest_first() {
        let h = default_harness();
        h.service.ingest(fix("truck-1", 1.0, 10.0)).await.unwrap();
        h.service.ingest(fix("truck-1", 2.0, 20.0)).await.unwrap();
        h.service.ingest(fix("truck-2", 9.0, 90.0)).await.unwrap();

        let route = h.service.route("truck-1", None).await.unwrap();

        assert_eq!(route.coordinates, vec![[10.0, 1.0], [20.0, 2.0]]);
    }

    #[tokio::test]
    async fn should_return_empty_route_for_unknown_device() {
        let h = default_harness();
        let route = h.service.route("ghost", None).await.unwrap();
        assert!(route.coordinates.is_empty());
    }
}

//! In-memory ports and a ready-made [`AppState`] for router tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::response::Response;
use http_body_util::BodyExt;
use tower_http::cors::CorsLayer;

use geofence_app::hub::{BroadcastHub, HubConfig};
use geofence_app::ports::{GeoIndex, GeofenceTrigger, LocationRepository, ZoneRepository};
use geofence_app::services::geo_cache::GeoCache;
use geofence_app::services::location_service::LocationService;
use geofence_app::services::zone_service::ZoneService;
use geofence_domain::error::GeofenceError;
use geofence_domain::id::{LocationId, ZoneId};
use geofence_domain::location::{LocationFix, Point};
use geofence_domain::nearby::{NearbyDevice, RadiusQuery};
use geofence_domain::zone::Zone;

use crate::state::{AppState, Hub};

#[derive(Default)]
pub struct InMemoryLocations {
    fixes: Mutex<Vec<(LocationId, LocationFix)>>,
    nearby: Mutex<Vec<NearbyDevice>>,
}

impl LocationRepository for InMemoryLocations {
    async fn create(&self, fix: &LocationFix) -> Result<LocationId, GeofenceError> {
        let id = LocationId::new();
        self.fixes.lock().unwrap().push((id, fix.clone()));
        Ok(id)
    }

    async fn find_nearby(&self, _query: RadiusQuery) -> Result<Vec<NearbyDevice>, GeofenceError> {
        Ok(self.nearby.lock().unwrap().clone())
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
pub struct InMemoryIndex {
    positions: Mutex<HashMap<String, Point>>,
}

impl GeoIndex for InMemoryIndex {
    async fn upsert_position(&self, device_id: &str, point: Point) -> Result<(), GeofenceError> {
        self.positions
            .lock()
            .unwrap()
            .insert(device_id.to_string(), point);
        Ok(())
    }

    async fn search_radius(&self, _query: RadiusQuery) -> Result<Vec<NearbyDevice>, GeofenceError> {
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
pub struct InMemoryZones {
    zones: Mutex<HashMap<ZoneId, Zone>>,
}

impl ZoneRepository for InMemoryZones {
    async fn find_containing(&self, _point: Point) -> Result<Vec<Zone>, GeofenceError> {
        Ok(vec![])
    }

    async fn get_all(&self) -> Result<Vec<Zone>, GeofenceError> {
        Ok(self.zones.lock().unwrap().values().cloned().collect())
    }

    async fn get_by_id(&self, id: ZoneId) -> Result<Option<Zone>, GeofenceError> {
        Ok(self.zones.lock().unwrap().get(&id).cloned())
    }

    async fn create(&self, zone: Zone) -> Result<Zone, GeofenceError> {
        self.zones.lock().unwrap().insert(zone.id, zone.clone());
        Ok(zone)
    }

    async fn update(&self, zone: Zone) -> Result<Option<Zone>, GeofenceError> {
        let mut zones = self.zones.lock().unwrap();
        Ok(zones.get_mut(&zone.id).map(|existing| {
            *existing = zone.clone();
            zone
        }))
    }

    async fn delete(&self, id: ZoneId) -> Result<(), GeofenceError> {
        self.zones.lock().unwrap().remove(&id);
        Ok(())
    }
}

/// Trigger that does nothing; evaluation is covered by the app crate.
pub struct NoopTrigger;

impl GeofenceTrigger for NoopTrigger {
    fn trigger(&self, _device_id: &str, _point: Point) {}
}

pub type TestState =
    AppState<Arc<InMemoryLocations>, Arc<InMemoryIndex>, NoopTrigger, Arc<InMemoryZones>>;

pub struct TestContext {
    pub locations: Arc<InMemoryLocations>,
    state: TestState,
}

impl TestContext {
    /// Requires a Tokio runtime: the hub task is spawned.
    pub fn new() -> Self {
        let (hub, _task) = BroadcastHub::spawn(HubConfig::default());
        Self::with_hub(hub)
    }

    /// Context whose hub task is not running.
    pub fn with_stopped_hub() -> Self {
        let (hub, handle) = BroadcastHub::new(HubConfig::default());
        drop(hub);
        Self::with_hub(handle)
    }

    fn with_hub(hub: Hub) -> Self {
        let locations = Arc::new(InMemoryLocations::default());
        let index = Arc::new(InMemoryIndex::default());
        let geo_cache = Arc::new(GeoCache::new(index, Arc::clone(&locations)));
        let location_service = LocationService::new(
            Arc::clone(&locations),
            geo_cache,
            hub.clone(),
            NoopTrigger,
        );
        let zone_service = ZoneService::new(Arc::new(InMemoryZones::default()));
        Self {
            locations,
            state: AppState::new(location_service, zone_service, hub),
        }
    }

    pub fn state(&self) -> TestState {
        self.state.clone()
    }

    pub fn app(&self) -> Router {
        crate::router::build(self.state(), CorsLayer::new())
    }

    pub fn stored_ids(&self) -> Vec<String> {
        self.locations
            .fixes
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.to_string())
            .collect()
    }

    pub fn seed_store_nearby(&self, device_id: &str, latitude: f64, longitude: f64) {
        self.locations.nearby.lock().unwrap().push(NearbyDevice {
            device_id: device_id.to_string(),
            latitude,
            longitude,
            distance: Some(1.0),
        });
    }

    pub async fn ingest(&self, device_id: &str, latitude: f64, longitude: f64) {
        let fix = LocationFix::builder()
            .device_id(device_id)
            .position(latitude, longitude)
            .build()
            .unwrap();
        self.state.location_service.ingest(fix).await.unwrap();
    }

    pub async fn seed_zone(&self, name: &str, geometry: serde_json::Value) -> Zone {
        self.state
            .zone_service
            .create_zone(name, geometry)
            .await
            .unwrap()
    }
}

pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

//! Shared application state for axum handlers.

use std::sync::Arc;

use geofence_app::hub::{ChannelSubscriber, HubHandle};
use geofence_app::ports::{GeoIndex, GeofenceTrigger, LocationRepository, ZoneRepository};
use geofence_app::services::location_service::LocationService;
use geofence_app::services::zone_service::ZoneService;

/// Handle to the broadcast hub used by the WebSocket surface.
pub type Hub = HubHandle<ChannelSubscriber>;

/// Default per-connection outbound queue length.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

/// Application state shared across all axum handlers.
///
/// Generic over the location store (`L`), geo index (`G`), evaluation
/// trigger (`T`) and zone store (`Z`) to avoid dynamic dispatch. `Clone` is
/// implemented manually so only the `Arc` wrappers are cloned.
pub struct AppState<L, G, T, Z> {
    /// Ingest, proximity and track queries.
    pub location_service: Arc<LocationService<L, G, Hub, T>>,
    /// Zone CRUD.
    pub zone_service: Arc<ZoneService<Z>>,
    /// Broadcast hub; every `/ws` connection registers here.
    pub hub: Hub,
    /// Outbound queue length of each WebSocket subscriber.
    pub subscriber_buffer: usize,
}

impl<L, G, T, Z> Clone for AppState<L, G, T, Z> {
    fn clone(&self) -> Self {
        Self {
            location_service: Arc::clone(&self.location_service),
            zone_service: Arc::clone(&self.zone_service),
            hub: self.hub.clone(),
            subscriber_buffer: self.subscriber_buffer,
        }
    }
}

impl<L, G, T, Z> AppState<L, G, T, Z>
where
    L: LocationRepository + Send + Sync + 'static,
    G: GeoIndex + Send + Sync + 'static,
    T: GeofenceTrigger + 'static,
    Z: ZoneRepository + Send + Sync + 'static,
{
    /// Create a new application state from service instances.
    pub fn new(
        location_service: LocationService<L, G, Hub, T>,
        zone_service: ZoneService<Z>,
        hub: Hub,
    ) -> Self {
        Self {
            location_service: Arc::new(location_service),
            zone_service: Arc::new(zone_service),
            hub,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
        }
    }

    /// Override the per-connection outbound queue length.
    #[must_use]
    pub fn with_subscriber_buffer(mut self, buffer: usize) -> Self {
        self.subscriber_buffer = buffer.max(1);
        self
    }
}

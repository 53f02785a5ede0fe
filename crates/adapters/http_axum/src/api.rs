//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod devices;
#[allow(clippy::missing_errors_doc)]
pub mod locations;
#[allow(clippy::missing_errors_doc)]
pub mod zones;

use axum::Router;
use axum::routing::{get, post, put};

use geofence_app::ports::{GeoIndex, GeofenceTrigger, LocationRepository, ZoneRepository};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<L, G, T, Z>() -> Router<AppState<L, G, T, Z>>
where
    L: LocationRepository + Send + Sync + 'static,
    G: GeoIndex + Send + Sync + 'static,
    T: GeofenceTrigger + 'static,
    Z: ZoneRepository + Send + Sync + 'static,
{
    Router::new()
        // Locations
        .route("/locations", post(locations::create::<L, G, T, Z>))
        // Devices
        .route("/devices/nearby", get(devices::nearby::<L, G, T, Z>))
        .route("/devices/{id}/track", get(devices::track::<L, G, T, Z>))
        .route("/devices/{id}/route", get(devices::route::<L, G, T, Z>))
        // Zones
        .route(
            "/zones",
            get(zones::list::<L, G, T, Z>).post(zones::create::<L, G, T, Z>),
        )
        .route(
            "/zones/{id}",
            put(zones::update::<L, G, T, Z>).delete(zones::delete::<L, G, T, Z>),
        )
}

//! Device proximity, track and route queries.

use axum::Json;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use geofence_app::ports::{GeoIndex, GeofenceTrigger, LocationRepository, ZoneRepository};
use geofence_domain::location::{LineString, LocationFix};
use geofence_domain::nearby::{NearbyDevice, NearbySource};

use crate::error::ApiError;
use crate::state::AppState;

/// Query string of the nearby endpoint.
#[derive(Debug, Deserialize)]
pub struct NearbyParams {
    pub lat: f64,
    pub lng: f64,
    /// Metres.
    pub radius: f64,
}

#[derive(Debug, Deserialize)]
pub struct TrackParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct NearbyBody {
    pub source: NearbySource,
    pub count: usize,
    pub data: Vec<NearbyDevice>,
}

pub enum NearbyResponse {
    Ok(Json<NearbyBody>),
}

impl IntoResponse for NearbyResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

pub enum TrackResponse {
    Ok(Json<Vec<LocationFix>>),
}

impl IntoResponse for TrackResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

pub enum RouteResponse {
    Ok(Json<LineString>),
}

impl IntoResponse for RouteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/devices/nearby?lat=..&lng=..&radius=..`
pub async fn nearby<L, G, T, Z>(
    State(state): State<AppState<L, G, T, Z>>,
    params: Result<Query<NearbyParams>, QueryRejection>,
) -> Result<NearbyResponse, ApiError>
where
    L: LocationRepository + Send + Sync + 'static,
    G: GeoIndex + Send + Sync + 'static,
    T: GeofenceTrigger + 'static,
    Z: ZoneRepository + Send + Sync + 'static,
{
    let Query(params) = params?;
    let result = state
        .location_service
        .nearby(params.lat, params.lng, params.radius)
        .await?;
    Ok(NearbyResponse::Ok(Json(NearbyBody {
        source: result.source,
        count: result.devices.len(),
        data: result.devices,
    })))
}

/// `GET /api/devices/{id}/track?limit=..`
pub async fn track<L, G, T, Z>(
    State(state): State<AppState<L, G, T, Z>>,
    device_id: Result<Path<String>, PathRejection>,
    params: Result<Query<TrackParams>, QueryRejection>,
) -> Result<TrackResponse, ApiError>
where
    L: LocationRepository + Send + Sync + 'static,
    G: GeoIndex + Send + Sync + 'static,
    T: GeofenceTrigger + 'static,
    Z: ZoneRepository + Send + Sync + 'static,
{
    let Path(device_id) = device_id?;
    let Query(params) = params?;
    let fixes = state
        .location_service
        .track(&device_id, params.limit)
        .await?;
    Ok(TrackResponse::Ok(Json(fixes)))
}

/// `GET /api/devices/{id}/route?limit=..`
///
/// The same window as the track, oldest first, as a GeoJSON `LineString`.
pub async fn route<L, G, T, Z>(
    State(state): State<AppState<L, G, T, Z>>,
    device_id: Result<Path<String>, PathRejection>,
    params: Result<Query<TrackParams>, QueryRejection>,
) -> Result<RouteResponse, ApiError>
where
    L: LocationRepository + Send + Sync + 'static,
    G: GeoIndex + Send + Sync + 'static,
    T: GeofenceTrigger + 'static,
    Z: ZoneRepository + Send + Sync + 'static,
{
    let Path(device_id) = device_id?;
    let Query(params) = params?;
    let line = state
        .location_service
        .route(&device_id, params.limit)
        .await?;
    Ok(RouteResponse::Ok(Json(line)))
}

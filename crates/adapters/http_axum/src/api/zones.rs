//! Zone management endpoints.

use std::str::FromStr;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use geofence_app::ports::{GeoIndex, GeofenceTrigger, LocationRepository, ZoneRepository};
use geofence_domain::error::ValidationError;
use geofence_domain::id::ZoneId;
use geofence_domain::zone::Zone;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a zone.
///
/// The geometry may be sent either as a `GeoJSON` object or as a string
/// holding one (`geojson`).
#[derive(Debug, Deserialize)]
pub struct CreateZoneRequest {
    pub name: String,
    #[serde(alias = "geojson")]
    pub geometry: serde_json::Value,
}

/// Request body for updating a zone. Omitting the geometry keeps the
/// current one.
#[derive(Debug, Deserialize)]
pub struct UpdateZoneRequest {
    pub name: String,
    #[serde(default, alias = "geojson")]
    pub geometry: Option<serde_json::Value>,
}

fn parse_geometry(value: serde_json::Value) -> Result<serde_json::Value, ValidationError> {
    match value {
        serde_json::Value::String(raw) => {
            serde_json::from_str(&raw).map_err(|_| ValidationError::InvalidGeometry)
        }
        other => Ok(other),
    }
}

fn parse_zone_id(raw: &str) -> Result<ZoneId, ValidationError> {
    ZoneId::from_str(raw).map_err(|_| ValidationError::InvalidId(raw.to_string()))
}

pub enum ListResponse {
    Ok(Json<Vec<Zone>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

pub enum CreateResponse {
    Created(Json<Zone>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

pub enum UpdateResponse {
    Ok(Json<Zone>),
}

impl IntoResponse for UpdateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/zones`
pub async fn list<L, G, T, Z>(
    State(state): State<AppState<L, G, T, Z>>,
) -> Result<ListResponse, ApiError>
where
    L: LocationRepository + Send + Sync + 'static,
    G: GeoIndex + Send + Sync + 'static,
    T: GeofenceTrigger + 'static,
    Z: ZoneRepository + Send + Sync + 'static,
{
    let zones = state.zone_service.list_zones().await?;
    Ok(ListResponse::Ok(Json(zones)))
}

/// `POST /api/zones`
pub async fn create<L, G, T, Z>(
    State(state): State<AppState<L, G, T, Z>>,
    req: Result<Json<CreateZoneRequest>, JsonRejection>,
) -> Result<CreateResponse, ApiError>
where
    L: LocationRepository + Send + Sync + 'static,
    G: GeoIndex + Send + Sync + 'static,
    T: GeofenceTrigger + 'static,
    Z: ZoneRepository + Send + Sync + 'static,
{
    let Json(req) = req?;
    let geometry = parse_geometry(req.geometry)?;
    let zone = state.zone_service.create_zone(req.name, geometry).await?;
    Ok(CreateResponse::Created(Json(zone)))
}

/// `PUT /api/zones/{id}`
pub async fn update<L, G, T, Z>(
    State(state): State<AppState<L, G, T, Z>>,
    id: Result<Path<String>, PathRejection>,
    req: Result<Json<UpdateZoneRequest>, JsonRejection>,
) -> Result<UpdateResponse, ApiError>
where
    L: LocationRepository + Send + Sync + 'static,
    G: GeoIndex + Send + Sync + 'static,
    T: GeofenceTrigger + 'static,
    Z: ZoneRepository + Send + Sync + 'static,
{
    let Path(id) = id?;
    let Json(req) = req?;
    let id = parse_zone_id(&id)?;
    let geometry = req.geometry.map(parse_geometry).transpose()?;
    let zone = state
        .zone_service
        .update_zone(id, req.name, geometry)
        .await?;
    Ok(UpdateResponse::Ok(Json(zone)))
}

/// `DELETE /api/zones/{id}`
pub async fn delete<L, G, T, Z>(
    State(state): State<AppState<L, G, T, Z>>,
    id: Result<Path<String>, PathRejection>,
) -> Result<DeleteResponse, ApiError>
where
    L: LocationRepository + Send + Sync + 'static,
    G: GeoIndex + Send + Sync + 'static,
    T: GeofenceTrigger + 'static,
    Z: ZoneRepository + Send + Sync + 'static,
{
    let Path(id) = id?;
    let id = parse_zone_id(&id)?;
    state.zone_service.delete_zone(id).await?;
    Ok(DeleteResponse::NoContent)
}

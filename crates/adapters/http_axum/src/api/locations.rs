//! Location ingest endpoint.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use geofence_app::ports::{GeoIndex, GeofenceTrigger, LocationRepository, ZoneRepository};
use geofence_domain::id::LocationId;
use geofence_domain::location::LocationFix;
use geofence_domain::time::Timestamp;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for reporting a position.
#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub device_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub accuracy: Option<f64>,
    /// Capture time; defaults to the time of receipt.
    pub recorded_at: Option<Timestamp>,
}

impl From<CreateLocationRequest> for LocationFix {
    fn from(req: CreateLocationRequest) -> Self {
        let mut builder = LocationFix::builder()
            .device_id(req.device_id)
            .position(req.latitude, req.longitude)
            .speed(req.speed)
            .heading(req.heading)
            .accuracy(req.accuracy);
        if let Some(recorded_at) = req.recorded_at {
            builder = builder.recorded_at(recorded_at);
        }
        builder.build_unchecked()
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedBody {
    pub status: &'static str,
    pub id: LocationId,
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<CreatedBody>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// `POST /api/locations`
pub async fn create<L, G, T, Z>(
    State(state): State<AppState<L, G, T, Z>>,
    req: Result<Json<CreateLocationRequest>, JsonRejection>,
) -> Result<CreateResponse, ApiError>
where
    L: LocationRepository + Send + Sync + 'static,
    G: GeoIndex + Send + Sync + 'static,
    T: GeofenceTrigger + 'static,
    Z: ZoneRepository + Send + Sync + 'static,
{
    let Json(req) = req?;
    let id = state.location_service.ingest(req.into()).await?;
    Ok(CreateResponse::Created(Json(CreatedBody {
        status: "created",
        id,
    })))
}

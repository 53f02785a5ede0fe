//! Axum router assembly.

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, Uri};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use geofence_app::ports::{GeoIndex, GeofenceTrigger, LocationRepository, ZoneRepository};

use crate::error::ApiError;
use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Mounts the JSON API under `/api` and the broadcast feed at `/ws`. Every
/// request gets an `x-request-id` (generated when absent, echoed on the
/// response) and is traced with [`TraceLayer`].
pub fn build<L, G, T, Z>(state: AppState<L, G, T, Z>, cors: CorsLayer) -> Router
where
    L: LocationRepository + Send + Sync + 'static,
    G: GeoIndex + Send + Sync + 'static,
    T: GeofenceTrigger + 'static,
    Z: ZoneRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check::<L, G, T, Z>))
        .route("/ws", get(crate::ws::subscribe::<L, G, T, Z>))
        .nest("/api", crate::api::routes())
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        )
        .with_state(state)
}

/// CORS policy for the given origins. `*` allows any origin; entries that
/// are not valid header values are ignored.
#[must_use]
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|_| tracing::warn!(origin = %origin, "ignoring invalid CORS origin"))
                .ok()
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::Rejected {
        status: StatusCode::NOT_FOUND,
        message: format!("no route for {}", uri.path()),
    }
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    version: &'static str,
    subscribers: usize,
}

async fn health_check<L, G, T, Z>(
    State(state): State<AppState<L, G, T, Z>>,
) -> Result<Json<HealthBody>, ApiError>
where
    L: LocationRepository + Send + Sync + 'static,
    G: GeoIndex + Send + Sync + 'static,
    T: GeofenceTrigger + 'static,
    Z: ZoneRepository + Send + Sync + 'static,
{
    let subscribers = state.hub.subscriber_count().await?;
    Ok(Json(HealthBody {
        status: "online",
        version: env!("CARGO_PKG_VERSION"),
        subscribers,
    }))
}

//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`GeofenceError`] via `#[from]` (no `String` variants at the top level).

/// Top-level error returned by every port and service.
#[derive(Debug, thiserror::Error)]
pub enum GeofenceError {
    /// Input rejected before any side effect happened.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A requested record does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A hard dependency (the durable store) failed.
    #[error("dependency error")]
    Dependency(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A best-effort dependency (cache, broadcast, audit log) failed.
    #[error("degraded dependency error")]
    Degraded(#[from] DegradedError),
}

impl GeofenceError {
    /// Wrap any adapter error as a hard dependency failure.
    pub fn dependency(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Dependency(Box::new(err))
    }
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("device id must not be empty")]
    EmptyDeviceId,

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("radius {0} must be a positive number of metres")]
    InvalidRadius(f64),

    #[error("limit {0} must be between 1 and {max}", max = crate::location::MAX_TRACK_LIMIT)]
    InvalidLimit(usize),

    #[error("name must not be empty")]
    EmptyName,

    #[error("geometry must be a GeoJSON object with a type")]
    InvalidGeometry,

    #[error("invalid identifier {0:?}")]
    InvalidId(String),
}

/// A lookup that found nothing.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Failures of best-effort collaborators. These are logged by the caller
/// and never fail the request that triggered them.
#[derive(Debug, thiserror::Error)]
pub enum DegradedError {
    /// The broadcast hub has shut down.
    #[error("broadcast hub is closed")]
    HubClosed,

    /// The broadcast hub queue stayed full for the whole enqueue timeout.
    #[error("broadcast hub queue is saturated")]
    HubSaturated,

    /// A broadcast message could not be serialized.
    #[error("failed to encode broadcast message")]
    Encode(#[from] serde_json::Error),

    /// A cache or audit dependency failed.
    #[error("{dependency} unavailable")]
    Unavailable {
        dependency: &'static str,
        #[source]
        source: Box<GeofenceError>,
    },
}

impl DegradedError {
    /// Classify a port failure as degraded for the named dependency.
    #[must_use]
    pub fn unavailable(dependency: &'static str, source: GeofenceError) -> Self {
        Self::Unavailable {
            dependency,
            source: Box::new(source),
        }
    }
}

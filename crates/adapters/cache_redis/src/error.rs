//! Cache-specific error type wrapping redis errors.

use geofence_domain::error::GeofenceError;

/// Errors originating from the Redis cache layer.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A command or connection failed.
    #[error("redis error")]
    Redis(#[from] redis::RedisError),
}

impl From<CacheError> for GeofenceError {
    fn from(err: CacheError) -> Self {
        Self::Dependency(Box::new(err))
    }
}

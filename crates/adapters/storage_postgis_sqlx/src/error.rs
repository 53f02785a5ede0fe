//! Storage-specific error type wrapping sqlx errors.

use geofence_domain::error::GeofenceError;

/// Errors originating from the `PostGIS` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to (de)serialize a `GeoJSON` geometry.
    #[error("geometry encoding error")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for GeofenceError {
    fn from(err: StorageError) -> Self {
        Self::Dependency(Box::new(err))
    }
}

//! Zone management — thin validated pass-through to the zone store.

use geofence_domain::error::{GeofenceError, NotFoundError};
use geofence_domain::id::ZoneId;
use geofence_domain::zone::{Zone, validate_geometry};

use crate::ports::ZoneRepository;

pub struct ZoneService<Z> {
    repo: Z,
}

impl<Z: ZoneRepository> ZoneService<Z> {
    pub fn new(repo: Z) -> Self {
        Self { repo }
    }

    /// # Errors
    ///
    /// Returns the store error.
    pub async fn list_zones(&self) -> Result<Vec<Zone>, GeofenceError> {
        self.repo.get_all().await
    }

    /// Create a zone with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`GeofenceError::Validation`] for a blank name or invalid
    /// geometry, or the store error.
    pub async fn create_zone(
        &self,
        name: impl Into<String>,
        geometry: serde_json::Value,
    ) -> Result<Zone, GeofenceError> {
        let zone = Zone::builder().name(name).geometry(geometry).build()?;
        let zone = self.repo.create(zone).await?;
        tracing::info!(zone_id = %zone.id, zone = %zone.name, "zone created");
        Ok(zone)
    }

    /// Rename a zone and optionally replace its geometry.
    ///
    /// Renaming changes the membership key of the zone, so devices inside it
    /// will see an EXIT followed by an ENTER on their next evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`GeofenceError::NotFound`] if the zone does not exist,
    /// [`GeofenceError::Validation`] for invalid input, or the store error.
    pub async fn update_zone(
        &self,
        id: ZoneId,
        name: impl Into<String>,
        geometry: Option<serde_json::Value>,
    ) -> Result<Zone, GeofenceError> {
        let name = name.into();
        if let Some(geometry) = &geometry {
            validate_geometry(geometry)?;
        }
        let existing = self.repo.get_by_id(id).await?.ok_or_else(|| not_found(id))?;

        let zone = Zone::builder()
            .id(id)
            .name(name)
            .geometry(geometry.unwrap_or(existing.geometry))
            .build()?;
        let updated = self.repo.update(zone).await?.ok_or_else(|| not_found(id))?;
        tracing::info!(zone_id = %id, zone = %updated.name, "zone updated");
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns [`GeofenceError::NotFound`] if the zone does not exist, or the
    /// store error.
    pub async fn delete_zone(&self, id: ZoneId) -> Result<(), GeofenceError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| not_found(id))?;
        self.repo.delete(id).await?;
        tracing::info!(zone_id = %id, "zone deleted");
        Ok(())
    }
}

fn not_found(id: ZoneId) -> GeofenceError {
    NotFoundError {
        entity: "Zone",
        id: id.to_string(),
    }
    .into()
}

//! Zone — a named polygon that devices can enter and leave.
//!
//! The geometry is carried as `GeoJSON` and never interpreted here;
//! containment is answered by the geospatial store.

use serde::{Deserialize, Serialize};

use crate::error::{GeofenceError, ValidationError};
use crate::id::ZoneId;

/// A named geographic zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub geometry: serde_json::Value,
}

impl Zone {
    /// Create a builder for constructing a [`Zone`].
    #[must_use]
    pub fn builder() -> ZoneBuilder {
        ZoneBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`GeofenceError::Validation`] when `name` is blank or the
    /// geometry is not a `GeoJSON` object carrying a `type`.
    pub fn validate(&self) -> Result<(), GeofenceError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        validate_geometry(&self.geometry)?;
        Ok(())
    }
}

/// Minimal structural check on a `GeoJSON` geometry.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidGeometry`] unless `geometry` is an object
/// with a string `type`.
pub fn validate_geometry(geometry: &serde_json::Value) -> Result<(), ValidationError> {
    match geometry.get("type") {
        Some(serde_json::Value::String(kind)) if !kind.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidGeometry),
    }
}

/// Step-by-step builder for [`Zone`].
#[derive(Debug, Default)]
pub struct ZoneBuilder {
    id: Option<ZoneId>,
    name: Option<String>,
    geometry: Option<serde_json::Value>,
}

impl ZoneBuilder {
    #[must_use]
    pub fn id(mut self, id: ZoneId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn geometry(mut self, geometry: serde_json::Value) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Consume the builder, validate, and return a [`Zone`].
    ///
    /// # Errors
    ///
    /// Returns [`GeofenceError::Validation`] if `name` or `geometry` are
    /// missing or invalid.
    pub fn build(self) -> Result<Zone, GeofenceError> {
        let zone = Zone {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            geometry: self.geometry.unwrap_or(serde_json::Value::Null),
        };
        zone.validate()?;
        Ok(zone)
    }
}

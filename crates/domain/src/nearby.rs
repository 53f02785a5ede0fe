//! Proximity query types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::location::Point;

/// A device found within a search radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyDevice {
    pub device_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Metres from the query point, when the backend reports it.
    pub distance: Option<f64>,
}

/// Which backend answered a proximity query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NearbySource {
    Cache,
    Store,
}

impl fmt::Display for NearbySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cache => "cache",
            Self::Store => "store",
        })
    }
}

/// A validated "devices within `radius` metres of `center`" query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusQuery {
    pub center: Point,
    pub radius_m: f64,
}

impl RadiusQuery {
    /// # Errors
    ///
    /// Returns [`ValidationError`] for out-of-range coordinates or a radius
    /// that is not a finite positive number.
    pub fn new(latitude: f64, longitude: f64, radius_m: f64) -> Result<Self, ValidationError> {
        let center = Point::new(latitude, longitude)?;
        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(ValidationError::InvalidRadius(radius_m));
        }
        Ok(Self { center, radius_m })
    }
}

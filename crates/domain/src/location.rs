//! Location fix — a single position report from a device.

use serde::{Deserialize, Serialize};

use crate::error::{GeofenceError, ValidationError};
use crate::time::{Timestamp, now};

/// Largest number of fixes returned by a single track query.
pub const MAX_TRACK_LIMIT: usize = 1000;

/// Track length used when the caller does not ask for one.
pub const DEFAULT_TRACK_LIMIT: usize = 100;

/// A WGS84 point in degrees.
///
/// Only constructible through [`Point::new`], so every value in circulation
/// is within range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    latitude: f64,
    longitude: f64,
}

impl Point {
    /// Build a point, rejecting out-of-range or NaN coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::LatitudeOutOfRange`] or
    /// [`ValidationError::LongitudeOutOfRange`].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    #[must_use]
    pub fn latitude(self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(self) -> f64 {
        self.longitude
    }
}

/// A validated position report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationFix {
    pub device_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub accuracy: Option<f64>,
    pub recorded_at: Timestamp,
}

impl LocationFix {
    /// Create a builder for constructing a [`LocationFix`].
    #[must_use]
    pub fn builder() -> LocationFixBuilder {
        LocationFixBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`GeofenceError::Validation`] when the device id is empty or
    /// the coordinates are out of range.
    pub fn validate(&self) -> Result<(), GeofenceError> {
        if self.device_id.trim().is_empty() {
            return Err(ValidationError::EmptyDeviceId.into());
        }
        Point::new(self.latitude, self.longitude)?;
        Ok(())
    }

    /// The fix position.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the coordinates are out of range.
    pub fn point(&self) -> Result<Point, ValidationError> {
        Point::new(self.latitude, self.longitude)
    }
}

/// Step-by-step builder for [`LocationFix`].
#[derive(Debug, Default)]
pub struct LocationFixBuilder {
    device_id: Option<String>,
    latitude: f64,
    longitude: f64,
    speed: Option<f64>,
    heading: Option<f64>,
    accuracy: Option<f64>,
    recorded_at: Option<Timestamp>,
}

impl LocationFixBuilder {
    #[must_use]
    pub fn device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    #[must_use]
    pub fn position(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    #[must_use]
    pub fn speed(mut self, speed: Option<f64>) -> Self {
        self.speed = speed;
        self
    }

    #[must_use]
    pub fn heading(mut self, heading: Option<f64>) -> Self {
        self.heading = heading;
        self
    }

    #[must_use]
    pub fn accuracy(mut self, accuracy: Option<f64>) -> Self {
        self.accuracy = accuracy;
        self
    }

    #[must_use]
    pub fn recorded_at(mut self, recorded_at: Timestamp) -> Self {
        self.recorded_at = Some(recorded_at);
        self
    }

    /// Consume the builder, validate, and return a [`LocationFix`].
    ///
    /// The capture time defaults to now.
    ///
    /// # Errors
    ///
    /// Returns [`GeofenceError::Validation`] if the device id is missing or
    /// the coordinates are out of range.
    pub fn build(self) -> Result<LocationFix, GeofenceError> {
        let fix = self.build_unchecked();
        fix.validate()?;
        Ok(fix)
    }

    /// Assemble the fix without checking invariants.
    ///
    /// Used by driving adapters that hand the fix straight to a service
    /// which validates it as its first step.
    #[must_use]
    pub fn build_unchecked(self) -> LocationFix {
        LocationFix {
            device_id: self.device_id.unwrap_or_default(),
            latitude: self.latitude,
            longitude: self.longitude,
            speed: self.speed,
            heading: self.heading,
            accuracy: self.accuracy,
            recorded_at: self.recorded_at.unwrap_or_else(now),
        }
    }
}

/// Validate a requested track length.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidLimit`] outside `1..=MAX_TRACK_LIMIT`.
pub fn validate_track_limit(limit: usize) -> Result<usize, ValidationError> {
    if (1..=MAX_TRACK_LIMIT).contains(&limit) {
        Ok(limit)
    } else {
        Err(ValidationError::InvalidLimit(limit))
    }
}

/// A device route as a `GeoJSON` `LineString`, oldest position first.
///
/// ```json
/// {"type":"LineString","coordinates":[[-99.13,19.43],[-99.12,19.44]]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "LineString")]
pub struct LineString {
    /// `[longitude, latitude]` pairs.
    pub coordinates: Vec<[f64; 2]>,
}

impl LineString {
    /// Build a route from a track ordered newest first.
    #[must_use]
    pub fn from_track(newest_first: &[LocationFix]) -> Self {
        Self {
            coordinates: newest_first
                .iter()
                .rev()
                .map(|fix| [fix.longitude, fix.latitude])
                .collect(),
        }
    }
}

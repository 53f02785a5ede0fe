//! Storage ports — the canonical geospatial store.

use std::future::Future;
use std::sync::Arc;

use geofence_domain::error::GeofenceError;
use geofence_domain::id::{LocationId, ZoneId};
use geofence_domain::location::{LocationFix, Point};
use geofence_domain::nearby::{NearbyDevice, RadiusQuery};
use geofence_domain::zone::Zone;

/// Durable storage for [`LocationFix`]es.
pub trait LocationRepository {
    /// Persist a fix and return the identifier assigned by the store.
    fn create(&self, fix: &LocationFix)
    -> impl Future<Output = Result<LocationId, GeofenceError>> + Send;

    /// Latest known position of every device within the query radius.
    fn find_nearby(
        &self,
        query: RadiusQuery,
    ) -> impl Future<Output = Result<Vec<NearbyDevice>, GeofenceError>> + Send;

    /// Most recent fixes of a device, newest first.
    fn find_by_device(
        &self,
        device_id: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LocationFix>, GeofenceError>> + Send;
}

/// Zone persistence plus point containment.
///
/// Containment is answered by the store itself; the application never
/// interprets zone geometry.
pub trait ZoneRepository {
    /// Every zone whose polygon contains `point`.
    fn find_containing(
        &self,
        point: Point,
    ) -> impl Future<Output = Result<Vec<Zone>, GeofenceError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<Zone>, GeofenceError>> + Send;

    fn get_by_id(
        &self,
        id: ZoneId,
    ) -> impl Future<Output = Result<Option<Zone>, GeofenceError>> + Send;

    fn create(&self, zone: Zone) -> impl Future<Output = Result<Zone, GeofenceError>> + Send;

    /// Update name and geometry of an existing zone. Returns `None` when the
    /// zone does not exist.
    fn update(
        &self,
        zone: Zone,
    ) -> impl Future<Output = Result<Option<Zone>, GeofenceError>> + Send;

    fn delete(&self, id: ZoneId) -> impl Future<Output = Result<(), GeofenceError>> + Send;
}

impl<T: LocationRepository + Send + Sync> LocationRepository for Arc<T> {
    fn create(
        &self,
        fix: &LocationFix,
    ) -> impl Future<Output = Result<LocationId, GeofenceError>> + Send {
        (**self).create(fix)
    }

    fn find_nearby(
        &self,
        query: RadiusQuery,
    ) -> impl Future<Output = Result<Vec<NearbyDevice>, GeofenceError>> + Send {
        (**self).find_nearby(query)
    }

    fn find_by_device(
        &self,
        device_id: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LocationFix>, GeofenceError>> + Send {
        (**self).find_by_device(device_id, limit)
    }
}

impl<T: ZoneRepository + Send + Sync> ZoneRepository for Arc<T> {
    fn find_containing(
        &self,
        point: Point,
    ) -> impl Future<Output = Result<Vec<Zone>, GeofenceError>> + Send {
        (**self).find_containing(point)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Zone>, GeofenceError>> + Send {
        (**self).get_all()
    }

    fn get_by_id(
        &self,
        id: ZoneId,
    ) -> impl Future<Output = Result<Option<Zone>, GeofenceError>> + Send {
        (**self).get_by_id(id)
    }

    fn create(&self, zone: Zone) -> impl Future<Output = Result<Zone, GeofenceError>> + Send {
        (**self).create(zone)
    }

    fn update(
        &self,
        zone: Zone,
    ) -> impl Future<Output = Result<Option<Zone>, GeofenceError>> + Send {
        (**self).update(zone)
    }

    fn delete(&self, id: ZoneId) -> impl Future<Output = Result<(), GeofenceError>> + Send {
        (**self).delete(id)
    }
}

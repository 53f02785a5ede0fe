//! Cache ports — the fast geo index and the membership snapshot store.
//!
//! Both live in an externally synchronised cache. Neither is kept strictly
//! consistent with the durable store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use geofence_domain::error::GeofenceError;
use geofence_domain::location::Point;
use geofence_domain::nearby::{NearbyDevice, RadiusQuery};

/// Geo-indexed last known position of every device.
pub trait GeoIndex {
    /// Overwrite the indexed position of `device_id`.
    fn upsert_position(
        &self,
        device_id: &str,
        point: Point,
    ) -> impl Future<Output = Result<(), GeofenceError>> + Send;

    /// Devices indexed within the query radius, nearest first.
    fn search_radius(
        &self,
        query: RadiusQuery,
    ) -> impl Future<Output = Result<Vec<NearbyDevice>, GeofenceError>> + Send;
}

/// Per-device set of encoded membership keys with a sliding expiry.
pub trait MembershipSnapshotStore {
    /// Raw members stored for `device_id`; empty when absent or expired.
    fn load(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<Vec<String>, GeofenceError>> + Send;

    /// Atomically replace the members of `device_id`.
    ///
    /// An empty `members` slice deletes the snapshot. A non-empty one
    /// (re)sets its expiry to `ttl`.
    fn replace(
        &self,
        device_id: &str,
        members: &[String],
        ttl: Duration,
    ) -> impl Future<Output = Result<(), GeofenceError>> + Send;
}

impl<T: GeoIndex + Send + Sync> GeoIndex for Arc<T> {
    fn upsert_position(
        &self,
        device_id: &str,
        point: Point,
    ) -> impl Future<Output = Result<(), GeofenceError>> + Send {
        (**self).upsert_position(device_id, point)
    }

    fn search_radius(
        &self,
        query: RadiusQuery,
    ) -> impl Future<Output = Result<Vec<NearbyDevice>, GeofenceError>> + Send {
        (**self).search_radius(query)
    }
}

impl<T: MembershipSnapshotStore + Send + Sync> MembershipSnapshotStore for Arc<T> {
    fn load(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<Vec<String>, GeofenceError>> + Send {
        (**self).load(device_id)
    }

    fn replace(
        &self,
        device_id: &str,
        members: &[String],
        ttl: Duration,
    ) -> impl Future<Output = Result<(), GeofenceError>> + Send {
        (**self).replace(device_id, members, ttl)
    }
}

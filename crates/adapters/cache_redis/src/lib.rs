//! # geofence-adapter-cache-redis
//!
//! Redis adapter implementing the cache ports of `geofence-app`.
//!
//! ## Responsibilities
//! - [`RedisGeoIndex`]: last known position of every device in one GEO key,
//!   queried by radius
//! - [`RedisSnapshotStore`]: one set of encoded membership keys per device,
//!   with a sliding expiry
//! - Share a single auto-reconnecting [`redis::aio::ConnectionManager`]
//!
//! ## Dependency rule
//! Depends on `geofence-app` (for port traits) and `geofence-domain` (for
//! domain types). The `app` and `domain` crates must never reference this
//! adapter.

pub mod connection;
pub mod error;
pub mod geo_index;
pub mod snapshot_store;

pub use connection::{Config, RedisCache};
pub use geo_index::RedisGeoIndex;
pub use snapshot_store::RedisSnapshotStore;

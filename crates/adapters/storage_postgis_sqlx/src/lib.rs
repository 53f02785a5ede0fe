//! # geofence-adapter-storage-postgis-sqlx
//!
//! `PostgreSQL` + `PostGIS` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement `LocationRepository`, `ZoneRepository` and `GeofenceEventLog`
//!   from `geofence-app::ports`
//! - Manage the connection pool lifecycle and run embedded migrations
//! - Delegate every spatial predicate (radius, containment) to `PostGIS`
//!
//! ## Dependency rule
//! Depends on `geofence-app` (for port traits) and `geofence-domain` (for
//! domain types). The `app` and `domain` crates must never reference this
//! adapter.

pub mod error;
pub mod event_log;
pub mod location_repo;
pub mod pool;
pub mod zone_repo;

pub use event_log::PgGeofenceEventLog;
pub use location_repo::PgLocationRepository;
pub use pool::{Config, Database};
pub use zone_repo::PgZoneRepository;

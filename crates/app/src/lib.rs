//! # geofence-app
//!
//! Application layer — use-cases, **port definitions** (traits) and the
//! in-process infrastructure that needs no IO.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `LocationRepository` — durable fix storage and proximity fallback
//!   - `ZoneRepository` — zone CRUD and point containment
//!   - `GeofenceEventLog` — append-only transition audit
//!   - `GeoIndex` — fast geo index of last known positions
//!   - `MembershipSnapshotStore` — TTL'd per-device zone membership
//! - Define **driving/inbound ports** as use-case structs:
//!   - `LocationService` — ingest a fix, proximity queries, device tracks and routes
//!   - `GeoCache` — cache-aside read path over the geo index and the store
//!   - `GeofenceEvaluator` — detect ENTER/EXIT transitions
//!   - `ZoneService` — validated zone CRUD
//! - Provide a per-device `KeyedLock` serializing evaluations and a
//!   `KeyedQueue` running triggered evaluations in arrival order
//! - Provide the **broadcast hub** actor that owns every live subscriber
//!
//! ## Dependency rule
//! Depends on `geofence-domain` only (plus `tokio` for tasks and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod hub;
pub mod keyed_lock;
pub mod keyed_queue;
pub mod ports;
pub mod services;

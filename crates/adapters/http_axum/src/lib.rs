//! # geofence-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the JSON API: location ingest, proximity and track queries,
//!   zone management (`/api/...`)
//! - Serve the real-time feed at `/ws`: every connection becomes a hub
//!   subscriber fed through a bounded per-connection queue
//! - Map application results and [`GeofenceError`](geofence_domain::error::GeofenceError)s
//!   into HTTP responses
//!
//! ## Dependency rule
//! Depends on `geofence-app` (for port traits and services) and
//! `geofence-domain` (for domain types used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
pub mod ws;

#[cfg(test)]
pub(crate) mod test_support;

//! Application services — use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod geo_cache;
pub mod geofence_evaluator;
pub mod location_service;
pub mod zone_service;

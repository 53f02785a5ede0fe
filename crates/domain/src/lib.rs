//! # geofence-domain
//!
//! Pure domain model for the geofence engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Location fixes** (validated position reports from devices)
//! - Define **Zones** (named polygons, geometry kept opaque as `GeoJSON`)
//! - Define **Membership keys** (the unit of zone set membership per device)
//! - Define **Geofence events** (ENTER / EXIT transitions)
//! - Define **Broadcast messages** (the wire schema pushed to live subscribers)
//! - Contain all invariant enforcement (coordinate ranges, non-empty names, …)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod event;
pub mod location;
pub mod membership;
pub mod message;
pub mod nearby;
pub mod zone;

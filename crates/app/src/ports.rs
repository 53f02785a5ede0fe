//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod cache;
pub mod event_bus;
pub mod event_log;
pub mod evaluation;
pub mod storage;

pub use cache::{GeoIndex, MembershipSnapshotStore};
pub use event_bus::BroadcastPublisher;
pub use event_log::GeofenceEventLog;
pub use evaluation::GeofenceTrigger;
pub use storage::{LocationRepository, ZoneRepository};

//! Broadcast port — push messages to every live subscriber.

use std::future::Future;
use std::sync::Arc;

use geofence_domain::error::GeofenceError;
use geofence_domain::message::BroadcastMessage;

/// Publishes [`BroadcastMessage`]s to all current subscribers.
pub trait BroadcastPublisher {
    /// Hand `message` to the broadcaster. Success means it was accepted for
    /// delivery, not that any subscriber received it.
    fn publish(
        &self,
        message: BroadcastMessage,
    ) -> impl Future<Output = Result<(), GeofenceError>> + Send;
}

impl<T: BroadcastPublisher + Send + Sync> BroadcastPublisher for Arc<T> {
    fn publish(
        &self,
        message: BroadcastMessage,
    ) -> impl Future<Output = Result<(), GeofenceError>> + Send {
        (**self).publish(message)
    }
}

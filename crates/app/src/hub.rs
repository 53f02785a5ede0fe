//! Broadcast hub — a single task that owns every live subscriber.
//!
//! The subscriber map is never shared: [`HubHandle`]s talk to the
//! [`BroadcastHub`] task through one bounded command queue, so register,
//! unregister and broadcast are linearized in queue order.
//!
//! Delivery must never block the hub. [`Subscriber::deliver`] is synchronous
//! and is expected to hand the payload to a per-connection buffer; any
//! delivery error evicts and closes that subscriber without affecting the
//! others.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::error::{SendTimeoutError, TrySendError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use geofence_domain::error::{DegradedError, GeofenceError};
use geofence_domain::message::{BroadcastMessage, Payload};

use crate::ports::BroadcastPublisher;

/// Why a payload could not be handed to a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The subscriber's outbound buffer is full (slow consumer).
    #[error("subscriber buffer is full")]
    Full,
    /// The subscriber's connection is gone.
    #[error("subscriber connection is closed")]
    Closed,
}

/// A connection owned by the hub between registration and eviction.
pub trait Subscriber: Send + 'static {
    /// Hand `payload` to the connection without waiting.
    ///
    /// # Errors
    ///
    /// Any error evicts the subscriber.
    fn deliver(&mut self, payload: &Payload) -> Result<(), DeliveryError>;

    /// Release the connection. Called once, when the hub drops it.
    fn close(&mut self) {}
}

/// Handle returned by [`HubHandle::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Tuning knobs for the hub.
#[derive(Debug, Clone, Copy)]
pub struct HubConfig {
    /// Capacity of the command queue.
    pub command_capacity: usize,
    /// How long a broadcast may wait for queue space before it is dropped.
    pub broadcast_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            command_capacity: 1024,
            broadcast_timeout: Duration::from_millis(250),
        }
    }
}

enum Command<S> {
    Register { id: SubscriberId, subscriber: S },
    Unregister(SubscriberId),
    Broadcast(Payload),
    Count(oneshot::Sender<usize>),
}

/// The task that owns the subscriber set.
pub struct BroadcastHub<S> {
    subscribers: HashMap<SubscriberId, S>,
    commands: mpsc::Receiver<Command<S>>,
}

impl<S: Subscriber> BroadcastHub<S> {
    /// Create a hub and its first handle without starting it.
    ///
    /// # Panics
    ///
    /// Panics if `config.command_capacity` is zero.
    #[must_use]
    pub fn new(config: HubConfig) -> (Self, HubHandle<S>) {
        let (sender, commands) = mpsc::channel(config.command_capacity);
        let hub = Self {
            subscribers: HashMap::new(),
            commands,
        };
        let handle = HubHandle {
            commands: sender,
            next_id: Arc::new(AtomicU64::new(0)),
            broadcast_timeout: config.broadcast_timeout,
        };
        (hub, handle)
    }

    /// Create a hub and run it on the current tokio runtime.
    ///
    /// The task ends, closing every remaining subscriber, once all handles
    /// are dropped.
    #[must_use]
    pub fn spawn(config: HubConfig) -> (HubHandle<S>, JoinHandle<()>) {
        let (hub, handle) = Self::new(config);
        (handle, tokio::spawn(hub.run()))
    }

    /// Process commands until every handle is gone.
    pub async fn run(mut self) {
        tracing::debug!("broadcast hub started");
        while let Some(command) = self.commands.recv().await {
            self.handle(command);
        }
        for (_, mut subscriber) in self.subscribers.drain() {
            subscriber.close();
        }
        tracing::debug!("broadcast hub stopped");
    }

    fn handle(&mut self, command: Command<S>) {
        match command {
            Command::Register { id, subscriber } => {
                self.subscribers.insert(id, subscriber);
                tracing::info!(
                    subscriber = %id,
                    total = self.subscribers.len(),
                    "subscriber connected"
                );
            }
            Command::Unregister(id) => {
                if let Some(mut subscriber) = self.subscribers.remove(&id) {
                    subscriber.close();
                    tracing::info!(
                        subscriber = %id,
                        total = self.subscribers.len(),
                        "subscriber disconnected"
                    );
                }
            }
            Command::Broadcast(payload) => self.fan_out(&payload),
            Command::Count(reply) => {
                let _ = reply.send(self.subscribers.len());
            }
        }
    }

    fn fan_out(&mut self, payload: &Payload) {
        self.subscribers
            .retain(|id, subscriber| match subscriber.deliver(payload) {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(subscriber = %id, %err, "evicting subscriber after failed write");
                    subscriber.close();
                    false
                }
            });
    }
}

/// Cheap, cloneable access to a running [`BroadcastHub`].
pub struct HubHandle<S> {
    commands: mpsc::Sender<Command<S>>,
    next_id: Arc<AtomicU64>,
    broadcast_timeout: Duration,
}

impl<S> Clone for HubHandle<S> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            next_id: Arc::clone(&self.next_id),
            broadcast_timeout: self.broadcast_timeout,
        }
    }
}

impl<S: Subscriber> HubHandle<S> {
    /// Add a subscriber. Waits for queue space; registrations are never
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`DegradedError::HubClosed`] if the hub task has stopped.
    pub async fn register(&self, subscriber: S) -> Result<SubscriberId, DegradedError> {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.commands
            .send(Command::Register { id, subscriber })
            .await
            .map_err(|_| DegradedError::HubClosed)?;
        Ok(id)
    }

    /// Remove and close a subscriber. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DegradedError::HubClosed`] if the hub task has stopped.
    pub async fn unregister(&self, id: SubscriberId) -> Result<(), DegradedError> {
        self.commands
            .send(Command::Unregister(id))
            .await
            .map_err(|_| DegradedError::HubClosed)
    }

    /// Serialize `message` once and queue it for every subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`DegradedError::Encode`] if serialization fails (nothing is
    /// queued), [`DegradedError::HubSaturated`] if the queue stayed full for
    /// the configured timeout, or [`DegradedError::HubClosed`].
    pub async fn broadcast(&self, message: &BroadcastMessage) -> Result<(), DegradedError> {
        let payload = message.encode().inspect_err(|err| {
            tracing::error!(%err, "dropping broadcast that failed to serialize");
        })?;
        self.commands
            .send_timeout(Command::Broadcast(payload), self.broadcast_timeout)
            .await
            .map_err(|err| match err {
                SendTimeoutError::Timeout(_) => DegradedError::HubSaturated,
                SendTimeoutError::Closed(_) => DegradedError::HubClosed,
            })
    }

    /// Number of live subscribers, as seen by the hub task.
    ///
    /// # Errors
    ///
    /// Returns [`DegradedError::HubClosed`] if the hub task has stopped.
    pub async fn subscriber_count(&self) -> Result<usize, DegradedError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Count(reply))
            .await
            .map_err(|_| DegradedError::HubClosed)?;
        response.await.map_err(|_| DegradedError::HubClosed)
    }
}

impl<S: Subscriber> BroadcastPublisher for HubHandle<S> {
    async fn publish(&self, message: BroadcastMessage) -> Result<(), GeofenceError> {
        Ok(self.broadcast(&message).await?)
    }
}

/// Subscriber backed by a bounded per-connection queue.
///
/// The connection task drains the receiving side and writes to the socket.
/// A full queue means the connection cannot keep up and gets evicted.
#[derive(Debug)]
pub struct ChannelSubscriber {
    sender: Option<mpsc::Sender<Payload>>,
}

impl ChannelSubscriber {
    /// Create a subscriber and the receiver its connection task drains.
    ///
    /// # Panics
    ///
    /// Panics if `buffer` is zero.
    #[must_use]
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Payload>) {
        let (sender, receiver) = mpsc::channel(buffer);
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }
}

impl Subscriber for ChannelSubscriber {
    fn deliver(&mut self, payload: &Payload) -> Result<(), DeliveryError> {
        let sender = self.sender.as_ref().ok_or(DeliveryError::Closed)?;
        sender
            .try_send(Arc::clone(payload))
            .map_err(|err| match err {
                TrySendError::Full(_) => DeliveryError::Full,
                TrySendError::Closed(_) => DeliveryError::Closed,
            })
    }

    fn close(&mut self) {
        self.sender = None;
    }
}

//! Geofence membership evaluator.
//!
//! For one device position, compares the zones that contain it now with the
//! membership snapshot left by the previous evaluation and emits an EXIT for
//! every zone left and an ENTER for every zone entered. Evaluations of the
//! same device are serialized; different devices run concurrently.
//!
//! Triggered evaluations run in the order their positions were reported:
//! each device has a pending queue drained by one background task.

use std::sync::Arc;
use std::time::Duration;

use geofence_domain::error::{DegradedError, GeofenceError};
use geofence_domain::event::{GeofenceEvent, Transition};
use geofence_domain::location::Point;
use geofence_domain::membership::{MembershipDiff, MembershipKey};
use geofence_domain::message::BroadcastMessage;

use crate::keyed_lock::KeyedLock;
use crate::keyed_queue::KeyedQueue;
use crate::ports::{
    BroadcastPublisher, GeofenceEventLog, GeofenceTrigger, MembershipSnapshotStore,
    ZoneRepository,
};

/// Default lifetime of a membership snapshot.
pub const DEFAULT_SNAPSHOT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Detects zone transitions and fans them out.
pub struct GeofenceEvaluator<Z, M, P, A> {
    zones: Z,
    snapshots: M,
    publisher: P,
    event_log: Arc<A>,
    snapshot_ttl: Duration,
    device_locks: KeyedLock,
    pending: KeyedQueue<Point>,
}

impl<Z, M, P, A> GeofenceEvaluator<Z, M, P, A>
where
    Z: ZoneRepository + Sync,
    M: MembershipSnapshotStore + Sync,
    P: BroadcastPublisher + Sync,
    A: GeofenceEventLog + Send + Sync + 'static,
{
    pub fn new(zones: Z, snapshots: M, publisher: P, event_log: A, snapshot_ttl: Duration) -> Self {
        Self {
            zones,
            snapshots,
            publisher,
            event_log: Arc::new(event_log),
            snapshot_ttl,
            device_locks: KeyedLock::new(),
            pending: KeyedQueue::new(),
        }
    }

    /// Devices with triggered evaluations still queued or running.
    #[must_use]
    pub fn pending_devices(&self) -> usize {
        self.pending.active_keys()
    }

    /// Evaluate `device_id` at `point`. Failures are logged, never returned.
    pub async fn evaluate(&self, device_id: &str, point: Point) {
        match self.try_evaluate(device_id, point).await {
            Ok(diff) if !diff.is_empty() => tracing::debug!(
                device_id,
                exited = diff.exited.len(),
                entered = diff.entered.len(),
                "evaluation complete"
            ),
            Ok(_) => {}
            Err(err) => tracing::error!(device_id, error = %err, "geofence evaluation aborted"),
        }
    }

    async fn try_evaluate(
        &self,
        device_id: &str,
        point: Point,
    ) -> Result<MembershipDiff, GeofenceError> {
        let _guard = self.device_locks.lock(device_id).await;

        let current: Vec<MembershipKey> = self
            .zones
            .find_containing(point)
            .await?
            .iter()
            .map(MembershipKey::from)
            .collect();
        let previous = self.load_previous(device_id).await;

        let diff = MembershipDiff::between(&previous, &current);
        for key in &diff.exited {
            self.emit(device_id, key, Transition::Exit).await;
        }
        for key in &diff.entered {
            self.emit(device_id, key, Transition::Enter).await;
        }

        let members: Vec<String> = current.iter().map(ToString::to_string).collect();
        if let Err(err) = self
            .snapshots
            .replace(device_id, &members, self.snapshot_ttl)
            .await
        {
            let err = DegradedError::unavailable("snapshot store", err);
            tracing::warn!(device_id, %err, "failed to write membership snapshot");
        }

        Ok(diff)
    }

    async fn load_previous(&self, device_id: &str) -> Vec<MembershipKey> {
        let raw = match self.snapshots.load(device_id).await {
            Ok(raw) => raw,
            Err(err) => {
                let err = DegradedError::unavailable("snapshot store", err);
                tracing::warn!(device_id, %err, "failed to read membership snapshot");
                return Vec::new();
            }
        };

        raw.iter()
            .filter_map(|entry| {
                entry
                    .parse::<MembershipKey>()
                    .inspect_err(|err| {
                        tracing::warn!(device_id, entry = %entry, error = %err, "skipping malformed snapshot entry");
                    })
                    .ok()
            })
            .collect()
    }

    async fn emit(&self, device_id: &str, key: &MembershipKey, transition: Transition) {
        let event = GeofenceEvent::new(device_id, key, transition);
        tracing::info!(
            device_id,
            zone = %key.zone_name,
            event = %transition,
            "geofence transition"
        );

        if let Err(err) = self
            .publisher
            .publish(BroadcastMessage::geofence_event(&event))
            .await
        {
            tracing::warn!(device_id, error = %err, "failed to broadcast geofence event");
        }

        let event_log = Arc::clone(&self.event_log);
        tokio::spawn(async move {
            if let Err(err) = event_log.record(event).await {
                let err = DegradedError::unavailable("event log", err);
                tracing::warn!(%err, "failed to record geofence event");
            }
        });
    }
}

impl<Z, M, P, A> GeofenceTrigger for Arc<GeofenceEvaluator<Z, M, P, A>>
where
    Z: ZoneRepository + Send + Sync + 'static,
    M: MembershipSnapshotStore + Send + Sync + 'static,
    P: BroadcastPublisher + Send + Sync + 'static,
    A: GeofenceEventLog + Send + Sync + 'static,
{
    fn trigger(&self, device_id: &str, point: Point) {
        if !self.pending.push(device_id, point) {
            return;
        }
        let evaluator = Arc::clone(self);
        let device_id = device_id.to_owned();
        tokio::spawn(async move {
            while let Some(point) = evaluator.pending.pop(&device_id) {
                evaluator.evaluate(&device_id, point).await;
            }
        });
    }
}

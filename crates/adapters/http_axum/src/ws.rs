//! WebSocket broadcast feed.
//!
//! Each connection is registered with the hub as a [`ChannelSubscriber`].
//! The hub never writes to the socket itself: it pushes payloads into the
//! connection's bounded queue and this task forwards them as text frames.
//! Frames sent by the client are read and discarded.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};

use geofence_app::hub::ChannelSubscriber;
use geofence_app::ports::{GeoIndex, GeofenceTrigger, LocationRepository, ZoneRepository};

use crate::state::{AppState, Hub};

/// `GET /ws`
pub async fn subscribe<L, G, T, Z>(
    State(state): State<AppState<L, G, T, Z>>,
    upgrade: WebSocketUpgrade,
) -> Response
where
    L: LocationRepository + Send + Sync + 'static,
    G: GeoIndex + Send + Sync + 'static,
    T: GeofenceTrigger + 'static,
    Z: ZoneRepository + Send + Sync + 'static,
{
    let hub = state.hub.clone();
    let buffer = state.subscriber_buffer;
    upgrade.on_upgrade(move |socket| serve(socket, hub, buffer))
}

async fn serve(socket: WebSocket, hub: Hub, buffer: usize) {
    let (subscriber, mut outbound) = ChannelSubscriber::channel(buffer);
    let id = match hub.register(subscriber).await {
        Ok(id) => id,
        Err(err) => {
            tracing::warn!(error = %err, "rejecting websocket subscriber");
            return;
        }
    };
    tracing::debug!(subscriber = %id, "websocket subscriber connected");

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            payload = outbound.recv() => {
                // None: the hub evicted this subscriber or shut down.
                let Some(payload) = payload else { break };
                if sink.send(Message::Text(payload.as_ref().into())).await.is_err() {
                    break;
                }
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    if let Err(err) = hub.unregister(id).await {
        tracing::debug!(subscriber = %id, error = %err, "unregister after disconnect failed");
    }
    tracing::debug!(subscriber = %id, "websocket subscriber disconnected");
}

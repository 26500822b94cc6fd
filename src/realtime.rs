//! Realtime fan-out to connected dashboard clients.
//!
//! A single tokio broadcast channel carries pre-encoded JSON frames. Each
//! WebSocket connection subscribes on upgrade; a failed send tears down only
//! that client's task, and unregistration is just dropping the receiver, so a
//! client that vanished twice is a no-op. Clients that connect after an event
//! fired never see it — there is no backlog or replay.

use axum::extract::ws::{Message, WebSocket};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

pub const EVENT_INTRUSION_UPDATED: &str = "intrusion_updated";
pub const EVENT_SCAN_COMPLETE: &str = "scan_complete";

#[derive(Clone)]
pub struct Hub {
    tx: broadcast::Sender<String>,
}

impl Hub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Encode `{type, data}` and fan it out to every current subscriber.
    /// No subscribers is fine.
    pub fn broadcast<T: Serialize>(&self, event: &str, data: &T) {
        let frame = serde_json::json!({ "type": event, "data": data }).to_string();
        match self.tx.send(frame) {
            Ok(receivers) => debug!(event, receivers, "broadcast delivered"),
            Err(_) => debug!(event, "broadcast with no connected clients"),
        }
    }
}

/// Drive one upgraded WebSocket connection until it closes.
pub async fn handle_socket(socket: WebSocket, hub: Hub) {
    let client_id = Utc::now().timestamp_millis().to_string();
    let (mut sender, mut receiver) = socket.split();

    let ack = serde_json::json!({
        "type": "connection",
        "status": "connected",
        "id": client_id,
    });
    if sender.send(Message::Text(ack.to_string())).await.is_err() {
        return;
    }
    debug!(%client_id, "websocket client connected");

    let mut rx = hub.subscribe();

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(frame) => {
                        if sender.send(Message::Text(frame)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(%client_id, skipped = n, "client lagging behind broadcasts");
                        let _ = sender.send(Message::Text(serde_json::json!({
                            "type": "info",
                            "message": format!("Skipped {} updates due to slow connection", n)
                        }).to_string())).await;
                    }
                    Err(_) => break,
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    Some(Err(_)) => break,
                    // The protocol has no client→server commands; ignore.
                    _ => {}
                }
            }
        }
    }

    debug!(%client_id, "websocket client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Payload {
        value: u32,
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_subscribers() {
        let hub = Hub::new(16);
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();

        hub.broadcast(EVENT_SCAN_COMPLETE, &Payload { value: 7 });

        let frame_a = a.recv().await.unwrap();
        let frame_b = b.recv().await.unwrap();
        assert_eq!(frame_a, frame_b);

        let parsed: serde_json::Value = serde_json::from_str(&frame_a).unwrap();
        assert_eq!(parsed["type"], "scan_complete");
        assert_eq!(parsed["data"]["value"], 7);
    }

    #[tokio::test]
    async fn test_dropped_subscriber_does_not_break_broadcast() {
        let hub = Hub::new(16);
        let a = hub.subscribe();
        let mut b = hub.subscribe();

        drop(a);
        hub.broadcast(EVENT_INTRUSION_UPDATED, &Payload { value: 1 });

        let frame = b.recv().await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(parsed["type"], "intrusion_updated");
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_a_noop() {
        let hub = Hub::new(16);
        // Must not panic or error.
        hub.broadcast(EVENT_SCAN_COMPLETE, &Payload { value: 0 });
    }
}

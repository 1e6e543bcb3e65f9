//! Bridge from the event stream to WebSocket subscribers.
//!
//! Three consumers (move-applied, session-started, session-ended) run on
//! their own connections and enqueue `(event_type, session_id, payload)`
//! into a bounded channel; a single drain task serializes each payload once
//! and fans it out through the registry. Consumers therefore never block on
//! a slow subscriber send, and a full queue backpressures the consumers
//! instead of growing without bound.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::domain::events;
use crate::error::AppError;
use crate::messaging::bus::{spawn_consumer, ConsumerConfig, EventBus, EventHandler};
use crate::ws::hub::{SessionBroadcast, SessionRegistry};

const BRIDGE_QUEUE_CAPACITY: usize = 256;

// Queue names are private to this service so the bridge never competes with
// the platform's own consumers for the same messages.
const QUEUE_MOVE_APPLIED: &str = "game.websocket.move_applied";
const QUEUE_SESSION_STARTED: &str = "game.websocket.session_started";
const QUEUE_SESSION_ENDED: &str = "game.websocket.session_ended";

#[derive(Debug)]
pub struct BridgeEvent {
    pub event_type: &'static str,
    pub session_id: String,
    pub payload: Value,
}

struct RelayHandler {
    event_type: &'static str,
    queue: mpsc::Sender<BridgeEvent>,
}

#[async_trait]
impl EventHandler for RelayHandler {
    async fn handle(&self, payload: Value) -> Result<(), AppError> {
        let Some(session_id) = payload
            .get("session_id")
            .and_then(Value::as_str)
            .map(str::to_string)
        else {
            warn!(event_type = self.event_type, "event without session_id, skipping");
            return Ok(());
        };

        self.queue
            .send(BridgeEvent {
                event_type: self.event_type,
                session_id,
                payload,
            })
            .await
            .map_err(|_| AppError::internal("broadcast queue closed".to_string()))
    }
}

/// Start the bridge consumers and the broadcast drain task.
pub fn start(
    bus: &Arc<EventBus>,
    registry: Arc<SessionRegistry>,
    shutdown: CancellationToken,
) -> Vec<JoinHandle<()>> {
    let (tx, rx) = mpsc::channel(BRIDGE_QUEUE_CAPACITY);

    let bindings: [(&'static str, &'static str, &'static str); 3] = [
        (QUEUE_MOVE_APPLIED, events::MOVE_APPLIED, "move_applied"),
        (QUEUE_SESSION_STARTED, events::SESSION_STARTED, "session_started"),
        (QUEUE_SESSION_ENDED, events::SESSION_ENDED, "session_ended"),
    ];

    let mut handles = Vec::with_capacity(bindings.len() + 1);
    for (queue, routing_key, event_type) in bindings {
        let handler = Arc::new(RelayHandler {
            event_type,
            queue: tx.clone(),
        });
        handles.push(spawn_consumer(
            bus.clone(),
            ConsumerConfig {
                queue,
                routing_key,
                dead_letter: false,
            },
            handler,
            shutdown.clone(),
        ));
    }
    drop(tx);

    handles.push(tokio::spawn(drain_loop(rx, registry, shutdown)));
    handles
}

async fn drain_loop(
    mut rx: mpsc::Receiver<BridgeEvent>,
    registry: Arc<SessionRegistry>,
    shutdown: CancellationToken,
) {
    info!("websocket broadcast loop started");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            event = rx.recv() => {
                let Some(event) = event else { break };

                // Serialize once for every subscriber of the session.
                let encoded = match serde_json::to_string(&event.payload) {
                    Ok(encoded) => encoded,
                    Err(err) => {
                        error!(error = %err, event_type = event.event_type, "failed to serialize broadcast payload");
                        continue;
                    }
                };

                debug!(
                    event_type = event.event_type,
                    session_id = %event.session_id,
                    subscribers = registry.connection_count(&event.session_id),
                    "broadcasting event"
                );
                registry.broadcast(
                    &event.session_id,
                    SessionBroadcast {
                        payload: Arc::new(encoded),
                    },
                );
            }
        }
    }

    info!("websocket broadcast loop stopped");
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn relay_extracts_session_id_and_enqueues() {
        let (tx, mut rx) = mpsc::channel(4);
        let handler = RelayHandler {
            event_type: "move_applied",
            queue: tx,
        };

        handler
            .handle(json!({"session_id": "s-1", "move_data": {"column": 3}}))
            .await
            .unwrap();
        // Missing session_id is skipped, not an error.
        handler.handle(json!({"move_data": {"column": 3}})).await.unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.session_id, "s-1");
        assert_eq!(event.event_type, "move_applied");
        assert!(rx.try_recv().is_err());
    }

    #[actix_web::test]
    async fn drain_loop_broadcasts_and_observes_shutdown() {
        use std::sync::Mutex;

        use actix::prelude::*;

        struct Probe {
            received: Arc<Mutex<Vec<String>>>,
        }
        impl Actor for Probe {
            type Context = Context<Self>;
        }
        impl Handler<SessionBroadcast> for Probe {
            type Result = ();
            fn handle(&mut self, msg: SessionBroadcast, _ctx: &mut Self::Context) {
                self.received.lock().unwrap().push(msg.payload.as_str().to_string());
            }
        }

        let registry = Arc::new(SessionRegistry::new());
        let received = Arc::new(Mutex::new(Vec::new()));
        let addr = Probe {
            received: received.clone(),
        }
        .start();
        registry.register("s-1", addr.recipient());

        let (tx, rx) = mpsc::channel(4);
        let shutdown = CancellationToken::new();
        let drain = tokio::spawn(drain_loop(rx, registry.clone(), shutdown.clone()));

        tx.send(BridgeEvent {
            event_type: "session_started",
            session_id: "s-1".to_string(),
            payload: json!({"session_id": "s-1", "type": "GAME_SESSION_STARTED"}),
        })
        .await
        .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(received.lock().unwrap().len(), 1);

        shutdown.cancel();
        drain.await.unwrap();
    }
}

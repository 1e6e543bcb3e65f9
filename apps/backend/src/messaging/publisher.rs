//! Event publication seam for the orchestrator.
//!
//! The orchestrator publishes best-effort: the session store is the source
//! of truth and a failed publish never rolls back a committed mutation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppError;
use crate::messaging::bus::EventBus;

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, routing_key: &str, payload: Value) -> Result<(), AppError>;
}

/// Publishes onto the shared event bus.
pub struct BusPublisher {
    bus: Arc<EventBus>,
}

impl BusPublisher {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl EventPublisher for BusPublisher {
    async fn publish(&self, routing_key: &str, payload: Value) -> Result<(), AppError> {
        self.bus.publish(routing_key, &payload).await
    }
}

/// Publisher that discards everything. Used when the service runs without a
/// broker (local dev, unit tests).
pub struct NullPublisher;

#[async_trait]
impl EventPublisher for NullPublisher {
    async fn publish(&self, _routing_key: &str, _payload: Value) -> Result<(), AppError> {
        Ok(())
    }
}

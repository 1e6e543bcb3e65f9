#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use backend::adapters::sessions_mem::InMemorySessionStore;
use backend::domain::rules::GameCatalog;
use backend::error::AppError;
use backend::messaging::publisher::EventPublisher;
use backend::services::sessions::{NewSession, SessionService};

#[ctor::ctor]
fn init_test_logging() {
    backend::telemetry::init_test_logging();
}

/// Publisher double that records every event for assertions.
#[derive(Default)]
pub struct CapturePublisher {
    events: Mutex<Vec<(String, Value)>>,
}

impl CapturePublisher {
    pub fn events(&self) -> Vec<(String, Value)> {
        self.events.lock().clone()
    }

    pub fn events_for(&self, routing_key: &str) -> Vec<Value> {
        self.events
            .lock()
            .iter()
            .filter(|(key, _)| key == routing_key)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

#[async_trait]
impl EventPublisher for CapturePublisher {
    async fn publish(&self, routing_key: &str, payload: Value) -> Result<(), AppError> {
        self.events.lock().push((routing_key.to_string(), payload));
        Ok(())
    }
}

/// Publisher double that always fails, for verifying best-effort semantics.
pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, _routing_key: &str, _payload: Value) -> Result<(), AppError> {
        Err(AppError::broker_unavailable("broker down".to_string()))
    }
}

pub struct TestHarness {
    pub sessions: Arc<SessionService>,
    pub store: Arc<InMemorySessionStore>,
    pub publisher: Arc<CapturePublisher>,
}

pub fn harness() -> TestHarness {
    let store = Arc::new(InMemorySessionStore::new());
    let publisher = Arc::new(CapturePublisher::default());
    let sessions = Arc::new(SessionService::new(
        GameCatalog::new(),
        store.clone(),
        publisher.clone(),
    ));
    TestHarness {
        sessions,
        store,
        publisher,
    }
}

pub fn connect_four_session(session_id: &str, players: &[&str], starting: &str) -> NewSession {
    NewSession {
        session_id: Some(session_id.to_string()),
        game_id: format!("game-{session_id}"),
        game_type: "connect_four".to_string(),
        lobby_id: None,
        player_ids: players.iter().map(|p| p.to_string()).collect(),
        starting_player_id: starting.to_string(),
        configuration: None,
        metadata: None,
    }
}

pub fn column(col: i64) -> Value {
    json!({ "column": col })
}

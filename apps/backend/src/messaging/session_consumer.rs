//! Consumer for `game.session.start.requested`.
//!
//! The lobby/matchmaking service requests a session; this handler validates
//! the request, creates the session through the orchestrator, and announces
//! it with `game.session.started`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info};

use crate::domain::events::{self, SessionStartRequested, SessionStarted};
use crate::error::AppError;
use crate::errors::domain::DomainError;
use crate::messaging::bus::{ConsumerConfig, EventHandler};
use crate::messaging::publisher::EventPublisher;
use crate::services::sessions::{NewSession, SessionService};

pub struct SessionStartConsumer {
    sessions: Arc<SessionService>,
    publisher: Arc<dyn EventPublisher>,
}

impl SessionStartConsumer {
    pub fn new(sessions: Arc<SessionService>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            sessions,
            publisher,
        }
    }

    pub fn config() -> ConsumerConfig {
        ConsumerConfig {
            queue: "game.session.start.requested",
            routing_key: events::SESSION_START_REQUESTED,
            dead_letter: true,
        }
    }
}

#[async_trait]
impl EventHandler for SessionStartConsumer {
    async fn handle(&self, payload: Value) -> Result<(), AppError> {
        let request: SessionStartRequested = match serde_json::from_value(payload) {
            Ok(request) => request,
            Err(err) => {
                error!(error = %err, "malformed session start request, dropping");
                return Ok(());
            }
        };

        let (Some(session_id), Some(game_type)) = (request.session_id, request.game_type) else {
            error!("session start request missing required fields, dropping");
            return Ok(());
        };
        if request.player_ids.is_empty() {
            error!(session_id = %session_id, "session start request without players, dropping");
            return Ok(());
        }

        let starting_player_id = request
            .starting_player_id
            .unwrap_or_else(|| request.player_ids[0].clone());

        let created = self
            .sessions
            .create_session(NewSession {
                session_id: Some(session_id.clone()),
                game_id: request.game_id.unwrap_or_else(|| game_type.clone()),
                game_type,
                lobby_id: request.lobby_id,
                player_ids: request.player_ids,
                starting_player_id,
                configuration: request.configuration,
                metadata: None,
            })
            .await;

        let session = match created {
            Ok(session) => session,
            // Client-caused rejections are poison for this queue: retrying
            // cannot fix them, so drop instead of dead-lettering real work.
            Err(err @ DomainError::Validation(..)) => {
                error!(error = %err, session_id = %session_id, "invalid session start request, dropping");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            session_id = %session.session_id,
            game_type = %session.game_type,
            "session created from start request"
        );

        let started = SessionStarted::from_session(&session);
        match serde_json::to_value(&started) {
            Ok(payload) => {
                if let Err(err) = self.publisher.publish(events::SESSION_STARTED, payload).await {
                    error!(
                        error = %err,
                        session_id = %session.session_id,
                        "failed to publish session started event"
                    );
                }
            }
            Err(err) => {
                error!(error = %err, "failed to serialize session started event");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::adapters::sessions_mem::InMemorySessionStore;
    use crate::domain::rules::GameCatalog;
    use crate::messaging::publisher::NullPublisher;

    fn consumer() -> (SessionStartConsumer, Arc<SessionService>) {
        let store = Arc::new(InMemorySessionStore::new());
        let publisher = Arc::new(NullPublisher);
        let sessions = Arc::new(SessionService::new(
            GameCatalog::new(),
            store,
            publisher.clone(),
        ));
        (
            SessionStartConsumer::new(sessions.clone(), publisher),
            sessions,
        )
    }

    #[tokio::test]
    async fn creates_session_and_defaults_starting_player() {
        let (consumer, sessions) = consumer();
        consumer
            .handle(json!({
                "session_id": "s-1",
                "game_id": "g-1",
                "game_type": "connect_four",
                "player_ids": ["a", "b"]
            }))
            .await
            .unwrap();

        let session = sessions.get_session("s-1").await.unwrap().unwrap();
        assert_eq!(session.current_player_id, "a");
        assert_eq!(session.player_ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn drops_requests_missing_required_fields() {
        let (consumer, sessions) = consumer();
        // Missing game_type: handled (dropped), not retried.
        consumer
            .handle(json!({ "session_id": "s-2", "player_ids": ["a", "b"] }))
            .await
            .unwrap();
        assert!(sessions.get_session("s-2").await.unwrap().is_none());

        // Empty player list.
        consumer
            .handle(json!({
                "session_id": "s-3",
                "game_type": "connect_four",
                "player_ids": []
            }))
            .await
            .unwrap();
        assert!(sessions.get_session("s-3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_request_is_idempotent() {
        let (consumer, sessions) = consumer();
        let request = json!({
            "session_id": "s-4",
            "game_id": "g-1",
            "game_type": "connect_four",
            "player_ids": ["a", "b"],
            "starting_player_id": "b"
        });
        consumer.handle(request.clone()).await.unwrap();
        consumer.handle(request).await.unwrap();

        let session = sessions.get_session("s-4").await.unwrap().unwrap();
        assert_eq!(session.current_player_id, "b");
        assert_eq!(session.total_moves, 0);
    }
}

//! Session orchestrator: lifecycle state machine, move application, events.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::events::{self, MoveApplied, SessionEnded};
use crate::domain::rules::GameCatalog;
use crate::domain::session::{GameSession, SessionStatus};
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind, ValidationKind};
use crate::messaging::publisher::EventPublisher;
use crate::repos::sessions::SessionStore;

/// Parameters for `create_session`. `session_id` is generated when absent.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub session_id: Option<String>,
    pub game_id: String,
    pub game_type: String,
    pub lobby_id: Option<String>,
    pub player_ids: Vec<String>,
    pub starting_player_id: String,
    pub configuration: Option<Value>,
    pub metadata: Option<Map<String, Value>>,
}

pub struct SessionService {
    catalog: GameCatalog,
    store: Arc<dyn SessionStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl SessionService {
    pub fn new(
        catalog: GameCatalog,
        store: Arc<dyn SessionStore>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            catalog,
            store,
            publisher,
        }
    }

    /// Create and persist a session. Idempotent under duplicate creation:
    /// an already-known `session_id` returns the existing record.
    pub async fn create_session(&self, new: NewSession) -> Result<GameSession, DomainError> {
        if let Some(session_id) = &new.session_id {
            if let Some(existing) = self.store.find_by_id(session_id).await? {
                info!(session_id = %session_id, "duplicate create, returning existing session");
                return Ok(existing);
            }
        }

        let session_id = new
            .session_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let rules = self.catalog.create(&new.game_type)?;
        let game_state = rules.create_initial_state(
            &new.player_ids,
            &new.starting_player_id,
            new.configuration.as_ref(),
        )?;

        let session = GameSession {
            session_id: session_id.clone(),
            game_id: new.game_id,
            game_type: new.game_type,
            lobby_id: new.lobby_id,
            player_ids: new.player_ids,
            current_player_id: new.starting_player_id,
            status: SessionStatus::Active,
            game_state,
            started_at: OffsetDateTime::now_utc(),
            ended_at: None,
            winner_id: None,
            total_moves: 0,
            metadata: new.metadata.unwrap_or_default(),
        };

        let session = self.store.save(&session).await?;
        info!(
            session_id = %session.session_id,
            game_type = %session.game_type,
            "created session"
        );
        Ok(session)
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<GameSession>, DomainError> {
        self.store.find_by_id(session_id).await
    }

    /// Look up a session or fail with the domain NotFound.
    pub async fn require_session(&self, session_id: &str) -> Result<GameSession, DomainError> {
        self.store.find_by_id(session_id).await?.ok_or_else(|| {
            DomainError::not_found(
                NotFoundKind::Session,
                format!("Session not found: {session_id}"),
            )
        })
    }

    /// Validate and apply one move, persist the result, and emit events.
    pub async fn apply_move(
        &self,
        session_id: &str,
        player_id: &str,
        move_data: Value,
    ) -> Result<GameSession, DomainError> {
        let mut session = self.require_session(session_id).await?;

        if !session.is_active() {
            return Err(DomainError::conflict(
                ConflictKind::InvalidSessionState,
                format!("Session is not active: {session_id}"),
            ));
        }
        if session.current_player_id != player_id {
            return Err(DomainError::validation(
                ValidationKind::WrongTurn,
                format!("It's not player {player_id}'s turn"),
            ));
        }

        let rules = self.catalog.create(&session.game_type)?;
        let new_state = rules.apply_move(&session.game_state, &move_data, player_id)?;

        session.current_player_id = rules.current_player_id(&new_state)?;
        session.game_state = new_state;
        session.total_moves += 1;

        let status = rules.status(&session.game_state)?;
        let finished = status.is_terminal();
        if finished {
            let winner_id = status.winner().map(str::to_string);
            session.finish(winner_id);
        }

        let session = self.store.save(&session).await?;
        info!(
            session_id = %session.session_id,
            move_number = session.total_moves,
            finished,
            "applied move"
        );

        self.publish_best_effort(
            events::MOVE_APPLIED,
            &MoveApplied::from_session(&session, player_id, move_data),
        )
        .await;

        if finished {
            self.publish_best_effort(
                events::SESSION_ENDED,
                &SessionEnded::from_session(&session, None),
            )
            .await;
        }

        Ok(session)
    }

    /// Abandon a session. With `force`, an already-terminal session is a
    /// no-op success instead of a conflict (best-effort "force leave").
    pub async fn abandon_session(
        &self,
        session_id: &str,
        player_id: &str,
        force: bool,
    ) -> Result<GameSession, DomainError> {
        let mut session = self.require_session(session_id).await?;

        if !force && !session.is_active() {
            return Err(DomainError::conflict(
                ConflictKind::InvalidSessionState,
                format!("Session is not active: {session_id}"),
            ));
        }
        if !session.has_player(player_id) {
            return Err(DomainError::validation(
                ValidationKind::PlayerNotInSession,
                format!("Player {player_id} is not in this session"),
            ));
        }

        if session.is_active() {
            let winner_id = session.opponent_of(player_id).map(str::to_string);
            session.abandon(winner_id);
            session = self.store.save(&session).await?;
            info!(
                session_id = %session.session_id,
                abandoned_by = %player_id,
                "abandoned session"
            );

            self.publish_best_effort(
                events::SESSION_ENDED,
                &SessionEnded::from_session(&session, Some(player_id)),
            )
            .await;
        } else {
            info!(
                session_id = %session.session_id,
                status = session.status.as_str(),
                "force abandon on terminal session, no state change"
            );
        }

        Ok(session)
    }

    /// Finished sessions containing `player_id`, most recent first.
    pub async fn match_history(
        &self,
        player_id: &str,
        limit: usize,
    ) -> Result<Vec<GameSession>, DomainError> {
        self.store
            .find_by_player(player_id, Some(SessionStatus::Finished), limit)
            .await
    }

    pub async fn sessions_for_game(&self, game_id: &str) -> Result<Vec<GameSession>, DomainError> {
        self.store.find_by_game_id(game_id).await
    }

    /// Events are a best-effort notification channel; the store is the
    /// source of truth, so failures are logged and swallowed.
    async fn publish_best_effort<E: Serialize>(&self, routing_key: &str, event: &E) {
        let payload = match serde_json::to_value(event) {
            Ok(payload) => payload,
            Err(err) => {
                error!(error = %err, routing_key, "failed to serialize event");
                return;
            }
        };
        if let Err(err) = self.publisher.publish(routing_key, payload).await {
            error!(error = %err, routing_key, "failed to publish event");
        }
    }
}

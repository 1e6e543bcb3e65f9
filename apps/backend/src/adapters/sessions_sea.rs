//! SeaORM adapter for the session store.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::Value;

use crate::domain::session::{GameSession, SessionStatus};
use crate::entities::game_sessions::{self, Entity as GameSessions};
use crate::errors::domain::{DomainError, InfraErrorKind};
use crate::repos::sessions::SessionStore;

pub struct SeaSessionStore {
    db: DatabaseConnection,
}

impl SeaSessionStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_active_model(session: &GameSession) -> Result<game_sessions::ActiveModel, DomainError> {
    Ok(game_sessions::ActiveModel {
        session_id: Set(session.session_id.clone()),
        game_id: Set(session.game_id.clone()),
        game_type: Set(session.game_type.clone()),
        lobby_id: Set(session.lobby_id.clone()),
        player_ids: Set(serde_json::to_value(&session.player_ids)?),
        current_player_id: Set(session.current_player_id.clone()),
        status: Set(session.status.as_str().to_string()),
        game_state: Set(session.game_state.clone()),
        started_at: Set(session.started_at),
        ended_at: Set(session.ended_at),
        winner_id: Set(session.winner_id.clone()),
        total_moves: Set(session.total_moves as i32),
        metadata: Set(Value::Object(session.metadata.clone())),
    })
}

fn to_domain(model: game_sessions::Model) -> Result<GameSession, DomainError> {
    let player_ids: Vec<String> = serde_json::from_value(model.player_ids)?;
    let metadata = match model.metadata {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        other => {
            return Err(DomainError::infra(
                InfraErrorKind::DataCorruption,
                format!("metadata column is not an object: {other}"),
            ));
        }
    };

    Ok(GameSession {
        session_id: model.session_id,
        game_id: model.game_id,
        game_type: model.game_type,
        lobby_id: model.lobby_id,
        player_ids,
        current_player_id: model.current_player_id,
        status: SessionStatus::try_from(model.status.as_str())?,
        game_state: model.game_state,
        started_at: model.started_at,
        ended_at: model.ended_at,
        winner_id: model.winner_id,
        total_moves: model.total_moves.max(0) as u32,
        metadata,
    })
}

#[async_trait]
impl SessionStore for SeaSessionStore {
    async fn save(&self, session: &GameSession) -> Result<GameSession, DomainError> {
        let active = to_active_model(session)?;
        let exists = GameSessions::find_by_id(session.session_id.clone())
            .one(&self.db)
            .await?
            .is_some();

        let saved = if exists {
            active.update(&self.db).await?
        } else {
            active.insert(&self.db).await?
        };
        to_domain(saved)
    }

    async fn find_by_id(&self, session_id: &str) -> Result<Option<GameSession>, DomainError> {
        let model = GameSessions::find_by_id(session_id.to_string())
            .one(&self.db)
            .await?;
        model.map(to_domain).transpose()
    }

    async fn find_by_game_id(&self, game_id: &str) -> Result<Vec<GameSession>, DomainError> {
        let models = GameSessions::find()
            .filter(game_sessions::Column::GameId.eq(game_id))
            .order_by_desc(game_sessions::Column::StartedAt)
            .all(&self.db)
            .await?;
        models.into_iter().map(to_domain).collect()
    }

    async fn find_by_player(
        &self,
        player_id: &str,
        status: Option<SessionStatus>,
        limit: usize,
    ) -> Result<Vec<GameSession>, DomainError> {
        let mut query = GameSessions::find();
        if let Some(status) = status {
            query = query.filter(game_sessions::Column::Status.eq(status.as_str()));
        }
        // player_ids is a JSON array; membership is filtered here rather than
        // with backend-specific JSON operators.
        let models = query
            .order_by_desc(game_sessions::Column::StartedAt)
            .all(&self.db)
            .await?;

        let mut sessions = Vec::new();
        for model in models {
            let session = to_domain(model)?;
            if session.has_player(player_id) {
                sessions.push(session);
                if sessions.len() >= limit {
                    break;
                }
            }
        }
        Ok(sessions)
    }
}

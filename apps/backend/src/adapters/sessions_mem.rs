//! In-memory session store for tests and broker-less local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::session::{GameSession, SessionStatus};
use crate::errors::domain::DomainError;
use crate::repos::sessions::SessionStore;

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, GameSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, session: &GameSession) -> Result<GameSession, DomainError> {
        self.sessions
            .write()
            .insert(session.session_id.clone(), session.clone());
        Ok(session.clone())
    }

    async fn find_by_id(&self, session_id: &str) -> Result<Option<GameSession>, DomainError> {
        Ok(self.sessions.read().get(session_id).cloned())
    }

    async fn find_by_game_id(&self, game_id: &str) -> Result<Vec<GameSession>, DomainError> {
        let mut sessions: Vec<GameSession> = self
            .sessions
            .read()
            .values()
            .filter(|s| s.game_id == game_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(sessions)
    }

    async fn find_by_player(
        &self,
        player_id: &str,
        status: Option<SessionStatus>,
        limit: usize,
    ) -> Result<Vec<GameSession>, DomainError> {
        let mut sessions: Vec<GameSession> = self
            .sessions
            .read()
            .values()
            .filter(|s| s.has_player(player_id))
            .filter(|s| status.is_none_or(|wanted| s.status == wanted))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        sessions.truncate(limit);
        Ok(sessions)
    }
}

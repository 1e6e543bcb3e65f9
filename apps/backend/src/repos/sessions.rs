//! Session store seam between the orchestrator and its persistence.
//!
//! The database adapter lives in `adapters::sessions_sea`; an in-memory
//! adapter (`adapters::sessions_mem`) backs tests and broker-less local runs.

use async_trait::async_trait;

use crate::domain::session::{GameSession, SessionStatus};
use crate::errors::domain::DomainError;

/// Persistence contract for session records.
///
/// `save` is an upsert keyed by `session_id`; the store is last-write-wins
/// per record (a single logical owner per session is assumed).
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save(&self, session: &GameSession) -> Result<GameSession, DomainError>;

    async fn find_by_id(&self, session_id: &str) -> Result<Option<GameSession>, DomainError>;

    async fn find_by_game_id(&self, game_id: &str) -> Result<Vec<GameSession>, DomainError>;

    /// Sessions containing `player_id`, optionally filtered by status,
    /// most recent first, capped at `limit`.
    async fn find_by_player(
        &self,
        player_id: &str,
        status: Option<SessionStatus>,
        limit: usize,
    ) -> Result<Vec<GameSession>, DomainError>;
}

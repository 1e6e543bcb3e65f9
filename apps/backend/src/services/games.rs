//! Stateless rule-engine operations over the document form.
//!
//! Used by the HTTP surface and the search advisor; the session
//! orchestrator goes through the catalog directly.

use serde_json::Value;

use crate::domain::rules::{GameCatalog, GameStatus};
use crate::errors::domain::DomainError;

#[derive(Debug, Clone, Copy, Default)]
pub struct GameService {
    catalog: GameCatalog,
}

impl GameService {
    pub fn new(catalog: GameCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> GameCatalog {
        self.catalog
    }

    pub fn list_available(&self) -> Vec<&'static str> {
        self.catalog.names()
    }

    pub fn create_initial_state(
        &self,
        game_type: &str,
        player_ids: &[String],
        starting_player_id: &str,
        configuration: Option<&Value>,
    ) -> Result<Value, DomainError> {
        self.catalog
            .create(game_type)?
            .create_initial_state(player_ids, starting_player_id, configuration)
    }

    pub fn apply_move(
        &self,
        game_type: &str,
        state: &Value,
        mv: &Value,
        player_id: &str,
    ) -> Result<Value, DomainError> {
        self.catalog.create(game_type)?.apply_move(state, mv, player_id)
    }

    pub fn legal_moves(
        &self,
        game_type: &str,
        state: &Value,
        player_id: &str,
    ) -> Result<Vec<Value>, DomainError> {
        self.catalog.create(game_type)?.legal_moves(state, player_id)
    }

    pub fn status(&self, game_type: &str, state: &Value) -> Result<GameStatus, DomainError> {
        self.catalog.create(game_type)?.status(state)
    }

    pub fn winner_id(&self, game_type: &str, state: &Value) -> Result<Option<String>, DomainError> {
        self.catalog.create(game_type)?.winner_id(state)
    }

    pub fn current_player_id(&self, game_type: &str, state: &Value) -> Result<String, DomainError> {
        self.catalog.create(game_type)?.current_player_id(state)
    }

    pub fn max_total_moves(&self, game_type: &str) -> Result<u32, DomainError> {
        Ok(self.catalog.create(game_type)?.max_total_moves())
    }
}

//! Game rule engine abstraction.
//!
//! Each game type implements [`GameRules`] over the canonical document form
//! (a JSON object), which is also what the session store and the event
//! stream carry. New game types are added by registering a factory entry
//! below; nothing in the orchestrator branches on the type string.

use serde_json::Value;

use crate::domain::connect_four::ConnectFour;
use crate::errors::domain::{DomainError, ValidationKind};

/// Terminal/ongoing evaluation of a game state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Win(String),
    Draw,
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameStatus::Ongoing)
    }

    pub fn winner(&self) -> Option<&str> {
        match self {
            GameStatus::Win(player_id) => Some(player_id),
            _ => None,
        }
    }
}

/// Capability set every game type provides.
///
/// States and moves cross this boundary in their document form so the
/// orchestrator, the store, and the search advisor stay game-agnostic.
/// Implementations deserialize into their own typed state internally and
/// must never mutate the caller's value.
pub trait GameRules: Send + Sync {
    fn game_type(&self) -> &'static str;

    fn create_initial_state(
        &self,
        player_ids: &[String],
        starting_player_id: &str,
        configuration: Option<&Value>,
    ) -> Result<Value, DomainError>;

    fn apply_move(&self, state: &Value, mv: &Value, player_id: &str) -> Result<Value, DomainError>;

    fn legal_moves(&self, state: &Value, player_id: &str) -> Result<Vec<Value>, DomainError>;

    fn status(&self, state: &Value) -> Result<GameStatus, DomainError>;

    fn winner_id(&self, state: &Value) -> Result<Option<String>, DomainError> {
        Ok(self.status(state)?.winner().map(str::to_string))
    }

    fn current_player_id(&self, state: &Value) -> Result<String, DomainError>;

    /// Upper bound on the number of moves a single playthrough can contain.
    /// Used as a hard cap for random playouts so they terminate even on
    /// malformed states.
    fn max_total_moves(&self) -> u32;
}

/// Factory definition for constructing rule engine implementations.
pub struct GameFactory {
    pub name: &'static str,
    pub make: fn() -> Box<dyn GameRules>,
}

static GAME_FACTORIES: &[GameFactory] = &[
    GameFactory {
        name: ConnectFour::GAME_TYPE,
        make: make_connect_four,
    },
    GameFactory {
        name: PassthroughRules::CHESS,
        make: make_chess_passthrough,
    },
];

/// Returns the statically registered game factories.
pub fn registered_games() -> &'static [GameFactory] {
    GAME_FACTORIES
}

/// Finds a registered game factory by its type name.
pub fn by_name(name: &str) -> Option<&'static GameFactory> {
    registered_games().iter().find(|factory| factory.name == name)
}

fn make_connect_four() -> Box<dyn GameRules> {
    Box::new(ConnectFour)
}

fn make_chess_passthrough() -> Box<dyn GameRules> {
    Box::new(PassthroughRules::new(PassthroughRules::CHESS))
}

/// Registry lookup wrapper handed to the services.
#[derive(Debug, Clone, Copy, Default)]
pub struct GameCatalog;

impl GameCatalog {
    pub fn new() -> Self {
        Self
    }

    pub fn create(&self, game_type: &str) -> Result<Box<dyn GameRules>, DomainError> {
        by_name(game_type).map(|factory| (factory.make)()).ok_or_else(|| {
            DomainError::validation(
                ValidationKind::UnknownGameType,
                format!("Unknown game type: {game_type}"),
            )
        })
    }

    pub fn contains(&self, game_type: &str) -> bool {
        by_name(game_type).is_some()
    }

    pub fn names(&self) -> Vec<&'static str> {
        registered_games().iter().map(|factory| factory.name).collect()
    }
}

/// Rules for game types whose moves are managed by an external engine.
///
/// The session record only tracks participants and configuration; applying
/// moves through this service is rejected and the status never terminates
/// on its own (abandonment still works at the session level).
pub struct PassthroughRules {
    game_type: &'static str,
}

impl PassthroughRules {
    pub const CHESS: &'static str = "chess";

    pub fn new(game_type: &'static str) -> Self {
        Self { game_type }
    }
}

impl GameRules for PassthroughRules {
    fn game_type(&self) -> &'static str {
        self.game_type
    }

    fn create_initial_state(
        &self,
        player_ids: &[String],
        starting_player_id: &str,
        configuration: Option<&Value>,
    ) -> Result<Value, DomainError> {
        if player_ids.is_empty() {
            return Err(DomainError::validation(
                ValidationKind::MissingField,
                "player_ids must be non-empty",
            ));
        }
        if !player_ids.iter().any(|p| p == starting_player_id) {
            return Err(DomainError::validation(
                ValidationKind::Other,
                format!("Starting player {starting_player_id} not in player list"),
            ));
        }
        Ok(serde_json::json!({
            "game_type": self.game_type,
            "player_ids": player_ids,
            "current_player_id": starting_player_id,
            "configuration": configuration.cloned().unwrap_or_else(|| Value::Object(Default::default())),
        }))
    }

    fn apply_move(&self, _state: &Value, _mv: &Value, _player_id: &str) -> Result<Value, DomainError> {
        Err(DomainError::validation(
            ValidationKind::InvalidMove,
            format!("Moves for {} are managed externally", self.game_type),
        ))
    }

    fn legal_moves(&self, _state: &Value, _player_id: &str) -> Result<Vec<Value>, DomainError> {
        Ok(Vec::new())
    }

    fn status(&self, _state: &Value) -> Result<GameStatus, DomainError> {
        Ok(GameStatus::Ongoing)
    }

    fn current_player_id(&self, state: &Value) -> Result<String, DomainError> {
        state
            .get("current_player_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                DomainError::validation(ValidationKind::MissingField, "current_player_id missing")
            })
    }

    fn max_total_moves(&self) -> u32 {
        0
    }
}

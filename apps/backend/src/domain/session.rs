//! Game session aggregate and its lifecycle state machine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::errors::domain::{DomainError, ValidationKind};

/// Lifecycle: created → active → {paused ⇄ active} → {finished | abandoned}.
/// Terminal states never transition backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    Active,
    Paused,
    Finished,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Created => "created",
            SessionStatus::Active => "active",
            SessionStatus::Paused => "paused",
            SessionStatus::Finished => "finished",
            SessionStatus::Abandoned => "abandoned",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Finished | SessionStatus::Abandoned)
    }
}

impl TryFrom<&str> for SessionStatus {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "created" => Ok(SessionStatus::Created),
            "active" => Ok(SessionStatus::Active),
            "paused" => Ok(SessionStatus::Paused),
            "finished" => Ok(SessionStatus::Finished),
            "abandoned" => Ok(SessionStatus::Abandoned),
            other => Err(DomainError::validation(
                ValidationKind::Other,
                format!("Unknown session status: {other}"),
            )),
        }
    }
}

/// The session aggregate root. Mutated only by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub session_id: String,
    pub game_id: String,
    pub game_type: String,
    pub lobby_id: Option<String>,
    pub player_ids: Vec<String>,
    pub current_player_id: String,
    pub status: SessionStatus,
    pub game_state: Value,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub ended_at: Option<OffsetDateTime>,
    pub winner_id: Option<String>,
    pub total_moves: u32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl GameSession {
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.player_ids.iter().any(|p| p == player_id)
    }

    /// For two-participant sessions, the participant other than `player_id`.
    pub fn opponent_of(&self, player_id: &str) -> Option<&str> {
        if self.player_ids.len() != 2 {
            return None;
        }
        self.player_ids
            .iter()
            .find(|p| p.as_str() != player_id)
            .map(String::as_str)
    }

    pub fn finish(&mut self, winner_id: Option<String>) {
        self.status = SessionStatus::Finished;
        self.winner_id = winner_id;
        self.ended_at = Some(OffsetDateTime::now_utc());
    }

    pub fn abandon(&mut self, winner_id: Option<String>) {
        self.status = SessionStatus::Abandoned;
        self.winner_id = winner_id;
        self.ended_at = Some(OffsetDateTime::now_utc());
    }

    pub fn pause(&mut self) {
        if self.is_active() {
            self.status = SessionStatus::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.status == SessionStatus::Paused {
            self.status = SessionStatus::Active;
        }
    }
}

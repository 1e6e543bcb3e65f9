//! Event contracts carried on the platform event stream.
//!
//! Routing keys are shared with the lobby/matchmaking service and the
//! realtime bridge; payload field names are part of the platform contract
//! (frontends read `move_data` and top-level `current_player_id`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::session::{GameSession, SessionStatus};

pub const SESSION_START_REQUESTED: &str = "game.session.start.requested";
pub const SESSION_STARTED: &str = "game.session.started";
pub const MOVE_APPLIED: &str = "game.move.applied";
pub const SESSION_ENDED: &str = "game.session.ended";

/// Inbound request from the lobby/matchmaking service.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionStartRequested {
    pub session_id: Option<String>,
    pub game_id: Option<String>,
    pub game_type: Option<String>,
    pub lobby_id: Option<String>,
    #[serde(default)]
    pub player_ids: Vec<String>,
    pub starting_player_id: Option<String>,
    pub configuration: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStarted {
    #[serde(rename = "eventId")]
    pub event_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub lobby_id: Option<String>,
    pub session_id: String,
    pub game_id: String,
    pub game_type: String,
    pub status: SessionStatus,
    pub game_state: Value,
    pub player_ids: Vec<String>,
    pub current_player_id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl SessionStarted {
    pub fn from_session(session: &GameSession) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            timestamp: session.started_at,
            lobby_id: session.lobby_id.clone(),
            session_id: session.session_id.clone(),
            game_id: session.game_id.clone(),
            game_type: session.game_type.clone(),
            status: session.status,
            game_state: session.game_state.clone(),
            player_ids: session.player_ids.clone(),
            current_player_id: session.current_player_id.clone(),
            kind: "GAME_SESSION_STARTED",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MoveApplied {
    #[serde(rename = "eventId")]
    pub event_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub session_id: String,
    pub game_id: String,
    pub game_type: String,
    pub player_id: String,
    pub move_data: Value,
    pub game_state: Value,
    pub current_player_id: String,
    pub status: SessionStatus,
    pub winner_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl MoveApplied {
    pub fn from_session(session: &GameSession, player_id: &str, move_data: Value) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            timestamp: OffsetDateTime::now_utc(),
            session_id: session.session_id.clone(),
            game_id: session.game_id.clone(),
            game_type: session.game_type.clone(),
            player_id: player_id.to_string(),
            move_data,
            game_state: session.game_state.clone(),
            current_player_id: session.current_player_id.clone(),
            status: session.status,
            winner_id: session.winner_id.clone(),
            kind: "GAME_MOVE_APPLIED",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionEnded {
    #[serde(rename = "eventId")]
    pub event_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub session_id: String,
    pub game_id: String,
    pub game_type: String,
    pub status: SessionStatus,
    pub winner_id: Option<String>,
    pub final_game_state: Value,
    pub total_moves: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abandoned_by: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl SessionEnded {
    pub fn from_session(session: &GameSession, abandoned_by: Option<&str>) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            timestamp: session.ended_at.unwrap_or_else(OffsetDateTime::now_utc),
            session_id: session.session_id.clone(),
            game_id: session.game_id.clone(),
            game_type: session.game_type.clone(),
            status: session.status,
            winner_id: session.winner_id.clone(),
            final_game_state: session.game_state.clone(),
            total_moves: session.total_moves,
            abandoned_by: abandoned_by.map(str::to_string),
            kind: "GAME_SESSION_ENDED",
        }
    }
}

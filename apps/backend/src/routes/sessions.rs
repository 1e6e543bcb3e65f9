//! HTTP surface for session lifecycle operations.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::services::sessions::NewSession;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
struct CreateSessionRequest {
    session_id: Option<String>,
    game_id: String,
    game_type: String,
    lobby_id: Option<String>,
    player_ids: Vec<String>,
    starting_player_id: Option<String>,
    configuration: Option<Value>,
    metadata: Option<Map<String, Value>>,
}

async fn create_session(
    app_state: web::Data<AppState>,
    body: web::Json<CreateSessionRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    if body.player_ids.is_empty() {
        return Err(AppError::validation(
            "MISSING_FIELD",
            "player_ids must be non-empty".to_string(),
        ));
    }

    let starting_player_id = body
        .starting_player_id
        .unwrap_or_else(|| body.player_ids[0].clone());

    let session = app_state
        .sessions
        .create_session(NewSession {
            session_id: body.session_id,
            game_id: body.game_id,
            game_type: body.game_type,
            lobby_id: body.lobby_id,
            player_ids: body.player_ids,
            starting_player_id,
            configuration: body.configuration,
            metadata: body.metadata,
        })
        .await?;

    Ok(HttpResponse::Created().json(session))
}

async fn get_session(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();
    let session = app_state.sessions.require_session(&session_id).await?;
    Ok(HttpResponse::Ok().json(session))
}

#[derive(Debug, Deserialize)]
struct ApplyMoveRequest {
    player_id: String,
    move_data: Value,
}

async fn apply_move(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ApplyMoveRequest>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();
    let body = body.into_inner();
    let session = app_state
        .sessions
        .apply_move(&session_id, &body.player_id, body.move_data)
        .await?;
    Ok(HttpResponse::Ok().json(session))
}

#[derive(Debug, Deserialize)]
struct AbandonRequest {
    player_id: String,
    #[serde(default)]
    force: bool,
}

async fn abandon_session(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<AbandonRequest>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();
    let body = body.into_inner();
    let session = app_state
        .sessions
        .abandon_session(&session_id, &body.player_id, body.force)
        .await?;
    Ok(HttpResponse::Ok().json(session))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    limit: usize,
}

fn default_history_limit() -> usize {
    20
}

async fn match_history(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse, AppError> {
    let player_id = path.into_inner();
    let sessions = app_state
        .sessions
        .match_history(&player_id, query.limit)
        .await?;
    Ok(HttpResponse::Ok().json(sessions))
}

#[derive(Serialize)]
struct AvailableGames {
    game_types: Vec<&'static str>,
}

async fn list_games(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(AvailableGames {
        game_types: app_state.games.list_available(),
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/sessions").route(web::post().to(create_session)))
        .service(web::resource("/sessions/{session_id}").route(web::get().to(get_session)))
        .service(web::resource("/sessions/{session_id}/moves").route(web::post().to(apply_move)))
        .service(
            web::resource("/sessions/{session_id}/abandon").route(web::post().to(abandon_session)),
        )
        .service(web::resource("/players/{player_id}/history").route(web::get().to(match_history)))
        .service(web::resource("/games").route(web::get().to(list_games)));
}

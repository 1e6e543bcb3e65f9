//! HTTP surface for the search advisor.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::Value;

use crate::ai::difficulty::AiLevel;
use crate::error::AppError;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
struct SuggestMoveRequest {
    game_type: String,
    game_state: Value,
    player_id: String,
    level: Option<AiLevel>,
    /// Explicit iteration budget; overrides `level` when present.
    iterations: Option<u32>,
}

async fn suggest_move(
    app_state: web::Data<AppState>,
    body: web::Json<SuggestMoveRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let advice = match body.iterations {
        Some(iterations) => app_state.ai.suggest_move_with_iterations(
            &body.game_type,
            &body.game_state,
            &body.player_id,
            iterations,
        )?,
        None => app_state.ai.suggest_move(
            &body.game_type,
            &body.game_state,
            &body.player_id,
            body.level.unwrap_or(AiLevel::Medium),
        )?,
    };

    Ok(HttpResponse::Ok().json(advice))
}

#[derive(Debug, Deserialize)]
struct RecalibrateRequest {
    current_level: AiLevel,
    win_rate: f64,
    target_win_rate: Option<f64>,
}

async fn recalibrate_difficulty(
    app_state: web::Data<AppState>,
    body: web::Json<RecalibrateRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    if !(0.0..=1.0).contains(&body.win_rate) {
        return Err(AppError::validation(
            "VALIDATION_ERROR",
            format!("win_rate must be within [0, 1], got {}", body.win_rate),
        ));
    }

    let adjustment = match body.target_win_rate {
        Some(target) => app_state
            .ai
            .recalibrate_against(body.current_level, body.win_rate, target),
        None => app_state.ai.recalibrate(body.current_level, body.win_rate),
    };

    Ok(HttpResponse::Ok().json(adjustment))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ai/move").route(web::post().to(suggest_move)))
        .service(web::resource("/ai/difficulty").route(web::post().to(recalibrate_difficulty)));
}

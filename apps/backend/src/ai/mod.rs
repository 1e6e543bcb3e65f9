pub mod difficulty;
pub mod mcts;

use serde::Serialize;
use serde_json::Value;

use crate::ai::difficulty::{recalibrate, AiLevel, DifficultyAdjustment, IterationBudgets};
use crate::ai::mcts::Mcts;
use crate::errors::domain::DomainError;
use crate::services::games::GameService;

/// Move recommendation returned to callers of the advisor.
#[derive(Debug, Clone, Serialize)]
pub struct MoveAdvice {
    pub best_move: Value,
    pub confidence: f64,
    pub iterations: u32,
    pub thinking_time_ms: f64,
}

/// MCTS-backed opponent with tiered iteration budgets.
#[derive(Debug, Clone)]
pub struct AiPlayerService {
    games: GameService,
    budgets: IterationBudgets,
}

impl AiPlayerService {
    pub fn new(games: GameService, budgets: IterationBudgets) -> Self {
        Self { games, budgets }
    }

    /// Recommend a move at a difficulty tier.
    pub fn suggest_move(
        &self,
        game_type: &str,
        state: &Value,
        player_id: &str,
        level: AiLevel,
    ) -> Result<MoveAdvice, DomainError> {
        self.suggest_move_with_iterations(game_type, state, player_id, self.budgets.iterations(level))
    }

    /// Recommend a move with an explicit iteration budget.
    pub fn suggest_move_with_iterations(
        &self,
        game_type: &str,
        state: &Value,
        player_id: &str,
        iterations: u32,
    ) -> Result<MoveAdvice, DomainError> {
        let mut search = Mcts::new(self.games, game_type);
        let result = search.search(state, player_id, iterations)?;

        Ok(MoveAdvice {
            best_move: result.best_move,
            confidence: result.win_rate,
            iterations: result.visits,
            thinking_time_ms: result.thinking_time_ms,
        })
    }

    pub fn recalibrate(&self, current_level: AiLevel, win_rate: f64) -> DifficultyAdjustment {
        recalibrate(current_level, win_rate, difficulty::TARGET_WIN_RATE)
    }

    pub fn recalibrate_against(
        &self,
        current_level: AiLevel,
        win_rate: f64,
        target_win_rate: f64,
    ) -> DifficultyAdjustment {
        recalibrate(current_level, win_rate, target_win_rate)
    }
}

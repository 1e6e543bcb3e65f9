//! Search advisor behavior through the public service surface.

mod support;

use backend::ai::difficulty::{AiLevel, IterationBudgets};
use backend::ai::mcts::Mcts;
use backend::ai::AiPlayerService;
use backend::domain::connect_four::ConnectFour;
use backend::domain::rules::{GameCatalog, GameRules};
use backend::services::games::GameService;
use serde_json::json;

fn games() -> GameService {
    GameService::new(GameCatalog::new())
}

fn advisor() -> AiPlayerService {
    AiPlayerService::new(games(), IterationBudgets::default())
}

fn fresh_state() -> serde_json::Value {
    ConnectFour
        .create_initial_state(&["a".to_string(), "b".to_string()], "a", None)
        .unwrap()
}

#[test]
fn suggests_a_legal_move_from_a_fresh_board() {
    let advice = advisor()
        .suggest_move(ConnectFour::GAME_TYPE, &fresh_state(), "a", AiLevel::Low)
        .unwrap();

    let column = advice.best_move["column"].as_i64().unwrap();
    assert!((0..7).contains(&column));
    assert!(advice.iterations > 0);
    assert!((0.0..=1.0).contains(&advice.confidence));
}

#[test]
fn takes_the_horizontal_win_with_a_seeded_search() {
    // "a" holds the bottom row at 0, 1, 2; column 3 completes four across.
    let mut state = fresh_state();
    for (player, col) in [("a", 0), ("b", 5), ("a", 1), ("b", 6), ("a", 2), ("b", 5)] {
        state = ConnectFour
            .apply_move(&state, &json!({ "column": col }), player)
            .unwrap();
    }

    let mut search = Mcts::with_seed(games(), ConnectFour::GAME_TYPE, 11);
    let result = search.search(&state, "a", 600).unwrap();
    assert_eq!(result.best_move, json!({"column": 3}));
    // The winning child only ever sees winning playouts.
    assert!(result.win_rate > 0.9);
}

#[test]
fn rejects_unknown_game_types() {
    let err = advisor().suggest_move("not_a_game", &fresh_state(), "a", AiLevel::Low);
    assert!(err.is_err());
}

#[test]
fn recalibration_follows_the_spec_table() {
    let advisor = advisor();

    let up = advisor.recalibrate(AiLevel::Low, 0.80);
    assert_eq!(up.recommended_level, AiLevel::Medium);
    assert!(up.reason.contains("Increasing"));

    let capped = advisor.recalibrate(AiLevel::VeryHigh, 0.80);
    assert_eq!(capped.recommended_level, AiLevel::VeryHigh);
    assert!(capped.reason.contains("maximum"));

    let steady = advisor.recalibrate(AiLevel::Medium, 0.55);
    assert_eq!(steady.recommended_level, AiLevel::Medium);
}

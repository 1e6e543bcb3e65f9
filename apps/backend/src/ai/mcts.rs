//! Monte Carlo Tree Search over the game-agnostic rule engine.
//!
//! Standard UCT: UCB1 selection (unvisited children first), one random
//! expansion per iteration, uniformly-random playouts, and backpropagation
//! that flips perspective at every level since players alternate. The
//! recommended move is the root child with the most visits (robust child),
//! not the best win rate.
//!
//! The tree is ephemeral: arena-allocated per search and discarded after.
//! States are snapshots; the caller's value is never mutated, so concurrent
//! searches over the same state are independent.

use std::collections::HashMap;
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::Value;

use crate::errors::domain::DomainError;
use crate::services::games::GameService;

pub const EXPLORATION: f64 = std::f64::consts::SQRT_2;

#[derive(Debug, Clone)]
pub struct MctsResult {
    pub best_move: Value,
    pub visits: u32,
    pub win_rate: f64,
    /// Win rate per root move, keyed by the move's index in the legal-move
    /// list the search started from.
    pub move_scores: HashMap<usize, f64>,
    pub move_visits: HashMap<usize, u32>,
    pub thinking_time_ms: f64,
}

impl MctsResult {
    fn empty() -> Self {
        Self {
            best_move: Value::Object(Default::default()),
            visits: 0,
            win_rate: 0.0,
            move_scores: HashMap::new(),
            move_visits: HashMap::new(),
            thinking_time_ms: 0.0,
        }
    }
}

struct Node {
    state: Value,
    parent: Option<usize>,
    mv: Option<Value>,
    move_idx: Option<usize>,
    children: Vec<usize>,
    untried: Vec<(usize, Value)>,
    visits: u32,
    wins: f64,
}

impl Node {
    fn win_rate(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.wins / self.visits as f64
        }
    }
}

pub struct Mcts {
    games: GameService,
    game_type: String,
    exploration: f64,
    rng: ChaCha8Rng,
}

impl Mcts {
    pub fn new(games: GameService, game_type: &str) -> Self {
        Self {
            games,
            game_type: game_type.to_string(),
            exploration: EXPLORATION,
            rng: ChaCha8Rng::from_os_rng(),
        }
    }

    /// Deterministic search for tests and reproducible evaluations.
    pub fn with_seed(games: GameService, game_type: &str, seed: u64) -> Self {
        Self {
            games,
            game_type: game_type.to_string(),
            exploration: EXPLORATION,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn search(
        &mut self,
        state: &Value,
        player_id: &str,
        iterations: u32,
    ) -> Result<MctsResult, DomainError> {
        let started = Instant::now();

        let legal = self.games.legal_moves(&self.game_type, state, player_id)?;
        if legal.is_empty() {
            return Ok(MctsResult::empty());
        }
        if legal.len() == 1 {
            // Nothing to search; report a neutral win rate.
            return Ok(MctsResult {
                best_move: legal[0].clone(),
                visits: 1,
                win_rate: 0.5,
                move_scores: HashMap::from([(0, 0.5)]),
                move_visits: HashMap::from([(0, 1)]),
                thinking_time_ms: 0.0,
            });
        }

        let player_ids: Vec<String> = state
            .get("player_ids")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();
        let max_playout_moves = self.games.max_total_moves(&self.game_type)?;

        let mut arena = vec![Node {
            state: state.clone(),
            parent: None,
            mv: None,
            move_idx: None,
            children: Vec::new(),
            untried: legal.iter().cloned().enumerate().collect(),
            visits: 0,
            wins: 0.0,
        }];

        for _ in 0..iterations {
            let mut node = 0usize;
            let mut current_player = player_id.to_string();

            // 1. Selection: descend through fully-expanded nodes by UCB1.
            while arena[node].untried.is_empty() && !arena[node].children.is_empty() {
                node = self.select_child(&arena, node);
                current_player = opponent(&current_player, &player_ids);
            }

            // 2. Expansion: attach one untried move as a new child.
            if !arena[node].untried.is_empty() {
                let pick = self.rng.random_range(0..arena[node].untried.len());
                let (move_idx, mv) = arena[node].untried.swap_remove(pick);
                let new_state =
                    self.games
                        .apply_move(&self.game_type, &arena[node].state, &mv, &current_player)?;
                let next_player = opponent(&current_player, &player_ids);

                let untried = if self.games.status(&self.game_type, &new_state)?.is_terminal() {
                    Vec::new()
                } else {
                    self.games
                        .legal_moves(&self.game_type, &new_state, &next_player)?
                        .into_iter()
                        .enumerate()
                        .collect()
                };

                arena.push(Node {
                    state: new_state,
                    parent: Some(node),
                    mv: Some(mv),
                    move_idx: Some(move_idx),
                    children: Vec::new(),
                    untried,
                    visits: 0,
                    wins: 0.0,
                });
                let child = arena.len() - 1;
                arena[node].children.push(child);
                node = child;
            }

            // 3. Simulation: random playout scored for the acting player.
            let outcome = self.simulate(&arena[node].state, player_id, max_playout_moves)?;

            // 4. Backpropagation: alternate perspective at each level.
            let mut cursor = Some(node);
            let mut score = outcome;
            while let Some(idx) = cursor {
                arena[idx].visits += 1;
                arena[idx].wins += match score {
                    1 => 1.0,
                    0 => 0.5,
                    _ => 0.0,
                };
                score = -score;
                cursor = arena[idx].parent;
            }
        }

        let root_children = arena[0].children.clone();
        if root_children.is_empty() {
            return Ok(MctsResult {
                best_move: legal[0].clone(),
                visits: arena[0].visits,
                win_rate: 0.5,
                move_scores: HashMap::new(),
                move_visits: HashMap::new(),
                thinking_time_ms: elapsed_ms(started),
            });
        }

        let best = root_children
            .iter()
            .copied()
            .max_by_key(|&child| arena[child].visits)
            .expect("root has children");

        let mut move_scores = HashMap::new();
        let mut move_visits = HashMap::new();
        for &child in &root_children {
            if let Some(idx) = arena[child].move_idx {
                move_scores.insert(idx, arena[child].win_rate());
                move_visits.insert(idx, arena[child].visits);
            }
        }

        Ok(MctsResult {
            best_move: arena[best].mv.clone().unwrap_or_default(),
            visits: arena[0].visits,
            win_rate: arena[best].win_rate(),
            move_scores,
            move_visits,
            thinking_time_ms: elapsed_ms(started),
        })
    }

    fn select_child(&self, arena: &[Node], node: usize) -> usize {
        let parent_visits = arena[node].visits.max(1) as f64;
        let mut best = arena[node].children[0];
        let mut best_score = f64::NEG_INFINITY;
        for &child in &arena[node].children {
            let score = if arena[child].visits == 0 {
                f64::INFINITY
            } else {
                arena[child].win_rate()
                    + self.exploration * (parent_visits.ln() / arena[child].visits as f64).sqrt()
            };
            if score > best_score {
                best_score = score;
                best = child;
            }
        }
        best
    }

    /// Random playout until the game ends, capped so malformed states cannot
    /// loop forever. Returns 1/0/-1 from the original player's perspective.
    fn simulate(
        &mut self,
        state: &Value,
        original_player: &str,
        max_moves: u32,
    ) -> Result<i32, DomainError> {
        let mut current = state.clone();

        for _ in 0..max_moves {
            let status = self.games.status(&self.game_type, &current)?;
            if status.is_terminal() {
                return Ok(score_for(original_player, status.winner()));
            }

            let player = self.games.current_player_id(&self.game_type, &current)?;
            let legal = self.games.legal_moves(&self.game_type, &current, &player)?;
            if legal.is_empty() {
                return Ok(0);
            }
            let mv = &legal[self.rng.random_range(0..legal.len())];
            current = self.games.apply_move(&self.game_type, &current, mv, &player)?;
        }

        let status = self.games.status(&self.game_type, &current)?;
        if status.is_terminal() {
            return Ok(score_for(original_player, status.winner()));
        }
        Ok(0)
    }
}

fn score_for(original_player: &str, winner: Option<&str>) -> i32 {
    match winner {
        None => 0,
        Some(winner) if winner == original_player => 1,
        Some(_) => -1,
    }
}

fn opponent(player: &str, player_ids: &[String]) -> String {
    if player_ids.len() == 2 {
        if player == player_ids[0] {
            player_ids[1].clone()
        } else {
            player_ids[0].clone()
        }
    } else {
        player.to_string()
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1_000.0
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::connect_four::{ConnectFour, ConnectFourState, COLS, ROWS};
    use crate::domain::rules::{GameCatalog, GameRules};

    fn games() -> GameService {
        GameService::new(GameCatalog::new())
    }

    fn players() -> Vec<String> {
        vec!["a".to_string(), "b".to_string()]
    }

    fn state_with_board(board: Vec<Vec<u8>>, current: &str) -> Value {
        ConnectFourState {
            board,
            current_player_id: current.to_string(),
            player_ids: players(),
            move_number: 0,
            game_type: ConnectFour::GAME_TYPE.to_string(),
        }
        .to_value()
        .unwrap()
    }

    #[test]
    fn ucb1_prefers_an_unvisited_sibling() {
        let mcts = Mcts::with_seed(games(), ConnectFour::GAME_TYPE, 7);
        let dummy = json!({});
        let arena = vec![
            Node {
                state: dummy.clone(),
                parent: None,
                mv: None,
                move_idx: None,
                children: vec![1, 2],
                untried: Vec::new(),
                visits: 10,
                wins: 5.0,
            },
            // Perfect score so far, but already explored.
            Node {
                state: dummy.clone(),
                parent: Some(0),
                mv: Some(json!({"column": 0})),
                move_idx: Some(0),
                children: Vec::new(),
                untried: Vec::new(),
                visits: 9,
                wins: 9.0,
            },
            Node {
                state: dummy,
                parent: Some(0),
                mv: Some(json!({"column": 1})),
                move_idx: Some(1),
                children: Vec::new(),
                untried: Vec::new(),
                visits: 0,
                wins: 0.0,
            },
        ];

        assert_eq!(mcts.select_child(&arena, 0), 2);
    }

    #[test]
    fn single_legal_move_short_circuits() {
        // Only column 6 is open.
        let mut board = vec![vec![0u8; COLS]; ROWS];
        for col in 0..COLS - 1 {
            board[0][col] = if col % 2 == 0 { 1 } else { 2 };
        }
        let state = state_with_board(board, "a");

        let mut mcts = Mcts::with_seed(games(), ConnectFour::GAME_TYPE, 7);
        let result = mcts.search(&state, "a", 10_000).unwrap();

        assert_eq!(result.best_move, json!({"column": 6}));
        assert_eq!(result.visits, 1);
        assert!((result.win_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(result.move_visits.get(&0), Some(&1));
    }

    #[test]
    fn no_legal_moves_returns_empty_result() {
        let mut board = vec![vec![0u8; COLS]; ROWS];
        for (row, board_row) in board.iter_mut().enumerate() {
            for (col, cell) in board_row.iter_mut().enumerate() {
                let block = (row / 2 + col / 2) % 2;
                *cell = if block == 0 { 1 } else { 2 };
            }
        }
        let state = state_with_board(board, "a");

        let mut mcts = Mcts::with_seed(games(), ConnectFour::GAME_TYPE, 7);
        let result = mcts.search(&state, "a", 100).unwrap();
        assert_eq!(result.visits, 0);
        assert!(result.move_visits.is_empty());
    }

    #[test]
    fn finds_the_immediate_winning_column() {
        // "a" has three stacked in column 3 and is to move.
        let mut state = ConnectFour
            .create_initial_state(&players(), "a", None)
            .unwrap();
        for col in [3i64, 6, 3, 6, 3, 6] {
            let player = ConnectFour.current_player_id(&state).unwrap();
            state = ConnectFour
                .apply_move(&state, &json!({ "column": col }), &player)
                .unwrap();
        }

        let mut mcts = Mcts::with_seed(games(), ConnectFour::GAME_TYPE, 42);
        let result = mcts.search(&state, "a", 400).unwrap();
        assert_eq!(result.best_move, json!({"column": 3}));
        assert_eq!(result.visits, 400);
    }
}

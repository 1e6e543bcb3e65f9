//! Connect-four ruleset: 6×7 grid, gravity drop, four-in-a-row.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::rules::{GameRules, GameStatus};
use crate::errors::domain::{DomainError, ValidationKind};

pub const ROWS: usize = 6;
pub const COLS: usize = 7;

/// Board cells: 0 = empty, 1 = first participant, 2 = second participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectFourState {
    pub board: Vec<Vec<u8>>,
    pub current_player_id: String,
    pub player_ids: Vec<String>,
    #[serde(default)]
    pub move_number: u32,
    #[serde(default = "default_game_type")]
    pub game_type: String,
}

fn default_game_type() -> String {
    ConnectFour::GAME_TYPE.to_string()
}

impl ConnectFourState {
    pub fn to_value(&self) -> Result<Value, DomainError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: &Value) -> Result<Self, DomainError> {
        serde_json::from_value(value.clone()).map_err(|e| {
            DomainError::validation(
                ValidationKind::Other,
                format!("Invalid connect_four state: {e}"),
            )
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectFourMove {
    pub column: i64,
}

impl ConnectFourMove {
    pub fn from_value(value: &Value) -> Result<Self, DomainError> {
        serde_json::from_value(value.clone()).map_err(|_| {
            DomainError::validation(
                ValidationKind::InvalidMove,
                "Missing 'column' in move data for connect_four",
            )
        })
    }
}

pub struct ConnectFour;

impl ConnectFour {
    pub const GAME_TYPE: &'static str = "connect_four";

    fn player_number(state: &ConnectFourState, player_id: &str) -> Result<usize, DomainError> {
        state
            .player_ids
            .iter()
            .position(|p| p == player_id)
            .map(|idx| idx + 1)
            .ok_or_else(|| {
                DomainError::validation(
                    ValidationKind::PlayerNotInSession,
                    format!("Player {player_id} is not in this game"),
                )
            })
    }

    fn check_winner(board: &[Vec<u8>]) -> Option<u8> {
        // Horizontal
        for row in 0..ROWS {
            for col in 0..COLS - 3 {
                let cell = board[row][col];
                if cell != 0
                    && cell == board[row][col + 1]
                    && cell == board[row][col + 2]
                    && cell == board[row][col + 3]
                {
                    return Some(cell);
                }
            }
        }

        // Vertical
        for row in 0..ROWS - 3 {
            for col in 0..COLS {
                let cell = board[row][col];
                if cell != 0
                    && cell == board[row + 1][col]
                    && cell == board[row + 2][col]
                    && cell == board[row + 3][col]
                {
                    return Some(cell);
                }
            }
        }

        // Diagonal (down-right)
        for row in 0..ROWS - 3 {
            for col in 0..COLS - 3 {
                let cell = board[row][col];
                if cell != 0
                    && cell == board[row + 1][col + 1]
                    && cell == board[row + 2][col + 2]
                    && cell == board[row + 3][col + 3]
                {
                    return Some(cell);
                }
            }
        }

        // Diagonal (down-left)
        for row in 0..ROWS - 3 {
            for col in 3..COLS {
                let cell = board[row][col];
                if cell != 0
                    && cell == board[row + 1][col - 1]
                    && cell == board[row + 2][col - 2]
                    && cell == board[row + 3][col - 3]
                {
                    return Some(cell);
                }
            }
        }

        None
    }

    fn is_board_full(board: &[Vec<u8>]) -> bool {
        (0..COLS).all(|col| board[0][col] != 0)
    }

    fn typed_status(state: &ConnectFourState) -> Result<GameStatus, DomainError> {
        if let Some(winner_num) = Self::check_winner(&state.board) {
            let winner_id = state
                .player_ids
                .get(winner_num as usize - 1)
                .cloned()
                .ok_or_else(|| {
                    DomainError::validation(
                        ValidationKind::Other,
                        format!("Winner slot {winner_num} has no participant"),
                    )
                })?;
            return Ok(GameStatus::Win(winner_id));
        }

        if Self::is_board_full(&state.board) {
            return Ok(GameStatus::Draw);
        }

        Ok(GameStatus::Ongoing)
    }
}

impl GameRules for ConnectFour {
    fn game_type(&self) -> &'static str {
        Self::GAME_TYPE
    }

    fn create_initial_state(
        &self,
        player_ids: &[String],
        starting_player_id: &str,
        _configuration: Option<&Value>,
    ) -> Result<Value, DomainError> {
        if player_ids.len() != 2 {
            return Err(DomainError::validation(
                ValidationKind::Other,
                "connect_four requires exactly 2 players",
            ));
        }
        if player_ids.iter().any(|p| p.trim().is_empty()) {
            return Err(DomainError::validation(
                ValidationKind::MissingField,
                "Player ID cannot be empty or whitespace-only",
            ));
        }
        if starting_player_id.trim().is_empty() {
            return Err(DomainError::validation(
                ValidationKind::MissingField,
                "Starting player ID must be non-empty",
            ));
        }
        if !player_ids.iter().any(|p| p == starting_player_id) {
            return Err(DomainError::validation(
                ValidationKind::Other,
                format!("Starting player {starting_player_id} not in player list"),
            ));
        }

        ConnectFourState {
            board: vec![vec![0; COLS]; ROWS],
            current_player_id: starting_player_id.to_string(),
            player_ids: player_ids.to_vec(),
            move_number: 0,
            game_type: Self::GAME_TYPE.to_string(),
        }
        .to_value()
    }

    fn apply_move(&self, state: &Value, mv: &Value, player_id: &str) -> Result<Value, DomainError> {
        let state = ConnectFourState::from_value(state)?;
        let mv = ConnectFourMove::from_value(mv)?;

        if state.current_player_id != player_id {
            return Err(DomainError::validation(
                ValidationKind::WrongTurn,
                format!("It's not player {player_id}'s turn"),
            ));
        }

        if mv.column < 0 || mv.column >= COLS as i64 {
            return Err(DomainError::validation(
                ValidationKind::InvalidMove,
                format!("Invalid column: {}", mv.column),
            ));
        }
        let column = mv.column as usize;

        let player_index = Self::player_number(&state, player_id)? - 1;
        let player_num = (player_index + 1) as u8;

        let mut board = state.board.clone();
        let landed = (0..ROWS).rev().find(|&row| board[row][column] == 0);
        match landed {
            Some(row) => board[row][column] = player_num,
            None => {
                return Err(DomainError::validation(
                    ValidationKind::InvalidMove,
                    format!("Column {column} is full"),
                ));
            }
        }

        let next_player_index = (player_index + 1) % state.player_ids.len();
        let next_player_id = state.player_ids[next_player_index].clone();

        ConnectFourState {
            board,
            current_player_id: next_player_id,
            player_ids: state.player_ids,
            move_number: state.move_number + 1,
            game_type: Self::GAME_TYPE.to_string(),
        }
        .to_value()
    }

    fn legal_moves(&self, state: &Value, _player_id: &str) -> Result<Vec<Value>, DomainError> {
        let state = ConnectFourState::from_value(state)?;
        let mut moves = Vec::new();
        for col in 0..COLS {
            if state.board[0][col] == 0 {
                moves.push(serde_json::json!({ "column": col }));
            }
        }
        Ok(moves)
    }

    fn status(&self, state: &Value) -> Result<GameStatus, DomainError> {
        let state = ConnectFourState::from_value(state)?;
        Self::typed_status(&state)
    }

    fn current_player_id(&self, state: &Value) -> Result<String, DomainError> {
        Ok(ConnectFourState::from_value(state)?.current_player_id)
    }

    fn max_total_moves(&self) -> u32 {
        (ROWS * COLS) as u32
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn players() -> Vec<String> {
        vec!["a".to_string(), "b".to_string()]
    }

    fn initial() -> Value {
        ConnectFour
            .create_initial_state(&players(), "a", None)
            .unwrap()
    }

    fn drop_col(state: &Value, col: i64) -> Value {
        let player = ConnectFour.current_player_id(state).unwrap();
        ConnectFour
            .apply_move(state, &serde_json::json!({ "column": col }), &player)
            .unwrap()
    }

    #[test]
    fn requires_exactly_two_players() {
        let three = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert!(ConnectFour.create_initial_state(&three, "a", None).is_err());
    }

    #[test]
    fn rejects_blank_player_ids() {
        let blank = vec!["a".to_string(), "  ".to_string()];
        assert!(ConnectFour.create_initial_state(&blank, "a", None).is_err());
    }

    #[test]
    fn pieces_stack_from_the_bottom() {
        let state = drop_col(&drop_col(&initial(), 3), 3);
        let typed = ConnectFourState::from_value(&state).unwrap();
        assert_eq!(typed.board[ROWS - 1][3], 1);
        assert_eq!(typed.board[ROWS - 2][3], 2);
        assert_eq!(typed.move_number, 2);
    }

    #[test]
    fn turn_alternates_between_participants() {
        let state = initial();
        assert_eq!(ConnectFour.current_player_id(&state).unwrap(), "a");
        let state = drop_col(&state, 0);
        assert_eq!(ConnectFour.current_player_id(&state).unwrap(), "b");
        let state = drop_col(&state, 0);
        assert_eq!(ConnectFour.current_player_id(&state).unwrap(), "a");
    }

    #[test]
    fn rejects_out_of_turn_moves() {
        let err = ConnectFour
            .apply_move(&initial(), &serde_json::json!({"column": 0}), "b")
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(ValidationKind::WrongTurn, _)
        ));
    }

    #[test]
    fn rejects_columns_outside_range() {
        for col in [-1i64, 7] {
            let err = ConnectFour
                .apply_move(&initial(), &serde_json::json!({ "column": col }), "a")
                .unwrap_err();
            assert!(matches!(
                err,
                DomainError::Validation(ValidationKind::InvalidMove, _)
            ));
        }
    }

    #[test]
    fn rejects_drop_into_full_column() {
        let mut state = initial();
        for _ in 0..ROWS {
            state = drop_col(&state, 2);
        }
        let player = ConnectFour.current_player_id(&state).unwrap();
        let err = ConnectFour
            .apply_move(&state, &serde_json::json!({"column": 2}), &player)
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(ValidationKind::InvalidMove, _)
        ));
        assert_eq!(ConnectFour.legal_moves(&state, &player).unwrap().len(), COLS - 1);
    }

    #[test]
    fn detects_horizontal_win() {
        // a: 0,1,2,3 / b: 0,1,2 stacked on top
        let mut state = initial();
        for col in [0, 0, 1, 1, 2, 2] {
            state = drop_col(&state, col);
        }
        state = drop_col(&state, 3);
        assert_eq!(
            ConnectFour.status(&state).unwrap(),
            GameStatus::Win("a".to_string())
        );
        assert_eq!(ConnectFour.winner_id(&state).unwrap(), Some("a".to_string()));
    }

    #[test]
    fn detects_vertical_win() {
        let mut state = initial();
        for col in [3, 6, 3, 6, 3, 6] {
            state = drop_col(&state, col);
        }
        state = drop_col(&state, 3);
        assert_eq!(
            ConnectFour.status(&state).unwrap(),
            GameStatus::Win("a".to_string())
        );
    }

    #[test]
    fn detects_down_right_diagonal_win() {
        let mut board = vec![vec![0u8; COLS]; ROWS];
        board[0][0] = 1;
        board[1][1] = 1;
        board[2][2] = 1;
        board[3][3] = 1;
        let state = ConnectFourState {
            board,
            current_player_id: "b".to_string(),
            player_ids: players(),
            move_number: 10,
            game_type: ConnectFour::GAME_TYPE.to_string(),
        }
        .to_value()
        .unwrap();
        assert_eq!(
            ConnectFour.status(&state).unwrap(),
            GameStatus::Win("a".to_string())
        );
    }

    #[test]
    fn detects_down_left_diagonal_win() {
        let mut board = vec![vec![0u8; COLS]; ROWS];
        board[0][5] = 2;
        board[1][4] = 2;
        board[2][3] = 2;
        board[3][2] = 2;
        let state = ConnectFourState {
            board,
            current_player_id: "a".to_string(),
            player_ids: players(),
            move_number: 11,
            game_type: ConnectFour::GAME_TYPE.to_string(),
        }
        .to_value()
        .unwrap();
        assert_eq!(
            ConnectFour.status(&state).unwrap(),
            GameStatus::Win("b".to_string())
        );
    }

    #[test]
    fn full_top_row_without_winner_is_a_draw() {
        // Alternating 2x2 column blocks never line up four of a kind.
        let mut board = vec![vec![0u8; COLS]; ROWS];
        for (row, board_row) in board.iter_mut().enumerate() {
            for (col, cell) in board_row.iter_mut().enumerate() {
                let block = (row / 2 + col / 2) % 2;
                *cell = if block == 0 { 1 } else { 2 };
            }
        }
        let state = ConnectFourState {
            board,
            current_player_id: "a".to_string(),
            player_ids: players(),
            move_number: 42,
            game_type: ConnectFour::GAME_TYPE.to_string(),
        };
        assert_eq!(ConnectFour::check_winner(&state.board), None);
        assert_eq!(
            ConnectFour.status(&state.to_value().unwrap()).unwrap(),
            GameStatus::Draw
        );
    }

    proptest! {
        // Every reachable state must survive the document round-trip intact.
        #[test]
        fn reachable_states_round_trip(cols in proptest::collection::vec(0i64..COLS as i64, 0..42)) {
            let mut state = initial();
            for col in cols {
                if ConnectFour.status(&state).unwrap().is_terminal() {
                    break;
                }
                let player = ConnectFour.current_player_id(&state).unwrap();
                match ConnectFour.apply_move(&state, &serde_json::json!({ "column": col }), &player) {
                    Ok(next) => state = next,
                    Err(_) => continue, // full column; not a legal move
                }
            }

            let typed = ConnectFourState::from_value(&state).unwrap();
            let round_tripped = ConnectFourState::from_value(&typed.to_value().unwrap()).unwrap();
            prop_assert_eq!(typed, round_tripped);
        }
    }
}

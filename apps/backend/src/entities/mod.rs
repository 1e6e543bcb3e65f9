pub mod game_sessions;

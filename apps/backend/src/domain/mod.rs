pub mod connect_four;
pub mod events;
pub mod rules;
pub mod session;

pub use rules::{by_name, registered_games, GameCatalog, GameFactory, GameRules, GameStatus};
pub use session::{GameSession, SessionStatus};

#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod adapters;
pub mod ai;
pub mod config;
pub mod domain;
pub mod entities;
pub mod error;
pub mod errors;
pub mod messaging;
pub mod middleware;
pub mod repos;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod ws;

// Re-exports for public API
pub use config::settings::Settings;
pub use domain::rules::{GameCatalog, GameRules, GameStatus};
pub use domain::session::{GameSession, SessionStatus};
pub use error::AppError;
pub use errors::domain::DomainError;
pub use repos::sessions::SessionStore;
pub use services::games::GameService;
pub use services::sessions::SessionService;
pub use state::app_state::{build_app_state, AppState};

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    telemetry::init_test_logging();
}

//! Application state and its explicit assembly.

use std::sync::Arc;

use crate::ai::difficulty::IterationBudgets;
use crate::ai::AiPlayerService;
use crate::domain::rules::GameCatalog;
use crate::messaging::publisher::EventPublisher;
use crate::repos::sessions::SessionStore;
use crate::services::games::GameService;
use crate::services::sessions::SessionService;
use crate::ws::hub::SessionRegistry;

/// Shared resources handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionService>,
    pub games: GameService,
    pub ai: AiPlayerService,
    registry: Arc<SessionRegistry>,
}

impl AppState {
    pub fn ws_registry(&self) -> Arc<SessionRegistry> {
        self.registry.clone()
    }
}

/// Build the service graph in dependency order: rule catalog, then the
/// stateless game service, then the orchestrator over the store and
/// publisher, then the advisor and the realtime registry. All wiring is
/// explicit; nothing is looked up at runtime.
pub fn build_app_state(
    store: Arc<dyn SessionStore>,
    publisher: Arc<dyn EventPublisher>,
    budgets: IterationBudgets,
) -> AppState {
    let catalog = GameCatalog::new();
    let games = GameService::new(catalog);
    let sessions = Arc::new(SessionService::new(catalog, store, publisher));
    let ai = AiPlayerService::new(games, budgets);
    let registry = Arc::new(SessionRegistry::new());

    AppState {
        sessions,
        games,
        ai,
        registry,
    }
}

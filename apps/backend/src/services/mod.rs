pub mod games;
pub mod sessions;

pub use games::GameService;
pub use sessions::{NewSession, SessionService};

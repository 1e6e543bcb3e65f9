//! WebSocket upgrade endpoint for per-session subscriptions.

use actix_web::web;

use crate::ws::session;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/games/ws/{session_id}").route(web::get().to(session::upgrade)));
}

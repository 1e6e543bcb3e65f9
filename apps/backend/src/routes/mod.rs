pub mod ai;
pub mod realtime;
pub mod sessions;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(sessions::configure_routes)
            .configure(ai::configure_routes),
    );
    realtime::configure_routes(cfg);
}

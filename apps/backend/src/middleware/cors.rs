use actix_cors::Cors;

/// CORS policy: locked to the configured origin, permissive when none is set
/// (local development).
pub fn cors_middleware(allowed_origin: Option<&str>) -> Cors {
    match allowed_origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allow_any_method()
            .allow_any_header()
            .max_age(3600),
        None => Cors::permissive(),
    }
}

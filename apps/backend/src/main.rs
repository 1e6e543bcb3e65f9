use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use backend::adapters::sessions_sea::SeaSessionStore;
use backend::config::settings::Settings;
use backend::messaging::bus::{spawn_consumer, EventBus};
use backend::messaging::publisher::BusPublisher;
use backend::messaging::session_consumer::SessionStartConsumer;
use backend::middleware::cors::cors_middleware;
use backend::routes;
use backend::state::app_state::build_app_state;
use backend::telemetry;
use backend::ws::bridge;
use tokio_util::sync::CancellationToken;

const CONSUMER_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment:
    // - Docker: set via compose env_file or docker run --env-file
    // - Local dev: source env files manually (e.g. set -a; . ./.env; set +a)
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    println!(
        "🚀 Starting game session backend on http://{}:{}",
        settings.host, settings.port
    );

    let db = match sea_orm::Database::connect(&settings.database_url).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("❌ Failed to connect to database: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = migration::migrate(&db, migration::MigrationCommand::Up).await {
        eprintln!("❌ Failed to run migrations: {e}");
        std::process::exit(1);
    }
    println!("✅ Database connected");

    let bus = match EventBus::connect(&settings.redis_url, settings.stream_prefix.clone()).await {
        Ok(bus) => bus,
        Err(e) => {
            eprintln!("❌ Failed to connect to event bus: {e}");
            std::process::exit(1);
        }
    };
    println!("✅ Event bus connected");

    let store = Arc::new(SeaSessionStore::new(db));
    let publisher = Arc::new(BusPublisher::new(bus.clone()));
    let app_state = build_app_state(store, publisher.clone(), settings.iteration_budgets());

    // Background consumers: session-start ingress plus the websocket bridge.
    let shutdown = CancellationToken::new();
    let mut consumer_handles = vec![spawn_consumer(
        bus.clone(),
        SessionStartConsumer::config(),
        Arc::new(SessionStartConsumer::new(
            app_state.sessions.clone(),
            publisher,
        )),
        shutdown.clone(),
    )];
    consumer_handles.extend(bridge::start(&bus, app_state.ws_registry(), shutdown.clone()));

    let allowed_origin = settings.allowed_origin.clone();
    let data = web::Data::new(app_state);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware(allowed_origin.as_deref()))
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await;

    // Bounded shutdown: flag the consumers, then give each loop a grace
    // period before the process exits anyway.
    shutdown.cancel();
    for handle in consumer_handles {
        let _ = tokio::time::timeout(CONSUMER_JOIN_TIMEOUT, handle).await;
    }

    server
}

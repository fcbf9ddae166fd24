use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use storefront::config::AppConfig;
use storefront::server;
use storefront::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront=debug,tower_http=debug".into()),
        )
        .init();

    let config = AppConfig::from_env();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL environment variable is required");
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
        .connect_lazy(&database_url)
        .expect("invalid DATABASE_URL");

    let port = config.server.port;
    let state = Arc::new(AppState::new(config, pool).expect("failed to build application state"));

    if std::env::var("RUN_MIGRATIONS").as_deref() == Ok("1") {
        storefront::database::migrations::run(&state.gateway)
            .await
            .expect("migrations failed");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|err| panic!("failed to bind {}: {}", addr, err));
    info!("listening on {}", addr);

    axum::serve(
        listener,
        server::app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server error");
}

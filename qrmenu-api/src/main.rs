use std::net::SocketAddr;
use std::sync::Arc;

use qrmenu_api::{app, state::{AppState, AuthConfig}};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qrmenu_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = qrmenu_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting QR Menu API on port {}", config.server.port);

    let pool = qrmenu_store::database::connect(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    qrmenu_store::database::migrate(&pool)
        .await
        .expect("Failed to run migrations");

    let orders = Arc::new(qrmenu_store::PgOrderRepository::new(
        pool,
        config.business_rules.invoice_retry_limit,
    ));

    // Order-event fan-out to SSE subscribers
    let (events_tx, _) = tokio::sync::broadcast::channel(100);

    let app_state = AppState {
        orders,
        events: events_tx,
        auth: AuthConfig { secret: config.auth.jwt_secret.clone() },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.expect("Failed to bind");
    axum::serve(listener, app).await.expect("Server error");
}

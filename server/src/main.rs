//! Gatherly HTTP server binary.
//!
//! Wires configuration, the PostgreSQL pool, the gateway clients, the
//! dispatcher, and the lifecycle manager into an axum router and serves it
//! until Ctrl+C.

use gatherly_server::lifecycle::EventLifecycle;
use gatherly_server::notify::{HttpPushGateway, NotificationDispatcher};
use gatherly_server::payment_gateway::HttpPaymentVerifier;
use gatherly_server::store::{
    PgAccountStore, PgEventStore, PgNotificationStore, PgSessionStore, PgTransactionStore,
};
use gatherly_server::{AppState, Config, build_router};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gatherly_server=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(
        postgres = %config.postgres.url,
        bind = %config.bind_addr(),
        "Configuration loaded"
    );

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .min_connections(config.postgres.min_connections)
        .acquire_timeout(Duration::from_secs(config.postgres.connect_timeout))
        .connect(&config.postgres.url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database connected, migrations applied");

    let accounts = Arc::new(PgAccountStore::new(pool.clone()));
    let events = Arc::new(PgEventStore::new(pool.clone()));
    let transactions = Arc::new(PgTransactionStore::new(pool.clone()));
    let notifications = Arc::new(PgNotificationStore::new(pool.clone()));
    let sessions = Arc::new(PgSessionStore::new(pool));

    let verifier = Arc::new(HttpPaymentVerifier::new(
        config.payment.base_url.clone(),
        config.payment.product_code.clone(),
        Duration::from_secs(config.payment.timeout),
    )?);
    let push = Arc::new(HttpPushGateway::new(
        config.push.endpoint.clone(),
        config.push.server_key.clone(),
        Duration::from_secs(config.push.timeout),
    )?);

    let dispatcher = Arc::new(NotificationDispatcher::new(
        notifications.clone(),
        accounts.clone(),
        push,
    ));
    let lifecycle = Arc::new(EventLifecycle::new(
        events.clone(),
        transactions.clone(),
        verifier,
        dispatcher.clone(),
    ));

    let state = AppState {
        lifecycle,
        dispatcher,
        accounts,
        events,
        transactions,
        notifications,
        sessions,
        session_ttl: chrono::Duration::seconds(i64::try_from(config.auth.session_ttl)?),
    };

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "Gatherly server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down gracefully...");
        })
        .await?;

    Ok(())
}

//! Funds-Transfer Service - Main Application Entry Point
//!
//! A REST API over the funds-transfer engine: create accounts, look them
//! up, and move money between them atomically with a double-entry ledger.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Engine**: `TransferService` over an injected `Store` boundary
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Build HTTP router with routes and middleware
//! 5. Start server on configured port

use funds_transfer_service::{
    config, db,
    handlers::{self, AppState},
    store::postgres::PgStore,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    // Wire the engine to the PostgreSQL store
    let state = AppState::new(Arc::new(PgStore::new(pool)));

    let app = Router::new()
        .route("/health", get(handlers::health::health_check))
        // Account management routes
        .route("/api/v1/accounts", post(handlers::accounts::create_account))
        .route(
            "/api/v1/accounts/{id}",
            get(handlers::accounts::get_account),
        )
        // Transfer route
        .route(
            "/api/v1/transfers",
            post(handlers::transfers::create_transfer),
        )
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        // Share state with all handlers via State extraction
        .with_state(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Start serving HTTP requests
    axum::serve(listener, app).await?;

    Ok(())
}

//! Stockroom - Backend Server

use std::{net::SocketAddr, sync::Arc};

use stockroom_backend::{
    create_app, db, init_tracing,
    services::{notification::notifier_from_config, AuthService},
    AppState, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    init_tracing(config.log.json);

    tracing::info!("Starting Stockroom Server");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::connect(&config.database).await?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations...");
    db::migrate(&db_pool).await?;
    tracing::info!("Migrations completed");

    let auth_service = AuthService::new(db_pool.clone(), &config);
    auth_service.ensure_bootstrap_admin(&config.bootstrap).await?;

    tokio::fs::create_dir_all(&config.uploads.dir).await?;

    let notifier = notifier_from_config(&config.notifications);

    // Create application state
    let state = AppState {
        db: db_pool,
        config: Arc::new(config.clone()),
        notifier,
    };

    // Build application
    let app = create_app(state);

    // Start server
    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

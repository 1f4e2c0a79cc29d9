//! # RentNest API Server
//!
//! REST API for property rental listings: user accounts, listing search and
//! CRUD with image uploads, plus the static frontend.
//!
//! ## Startup
//!
//! 1. Load configuration from the environment (and `.env`)
//! 2. Connect to MongoDB, or use the in-memory store for `MONGO_URI=memory://`
//! 3. Seed the admin account if it is missing
//! 4. Bind `PORT`, moving to the next port while it is taken (up to 5 times)
//! 5. Serve until Ctrl-C
//!
//! Any startup failure is logged and the process exits with status 1.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) cargo run -p rentnest-api
//! ```

use rentnest_api::{
    app::{build_router, AppState},
    bootstrap::{bind_with_retry, seed_admin},
    config::Config,
};
use rentnest_shared::db::{memory::MemoryStore, mongo::MongoStore, Store};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rentnest_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run().await {
        tracing::error!("Startup failed: {:#}", err);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    tracing::info!(
        "RentNest API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = if config.database.is_memory() {
        tracing::warn!("Using in-memory store; data will not survive a restart");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(MongoStore::connect(&config.database.uri).await?)
    };

    seed_admin(store.as_ref(), &config.admin).await?;

    let listener = bind_with_retry(&config.api.host, config.api.port).await?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    let app = build_router(AppState::new(store, config));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, exiting...");
}

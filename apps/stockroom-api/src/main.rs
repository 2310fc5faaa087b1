//! # Stockroom API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  main                                                                  │
//! │   ├── init_tracing()            RUST_LOG or info,stockroom=debug       │
//! │   ├── ApiConfig::load()         defaults → TOML → STOCKROOM_* env       │
//! │   ├── Database::new()           pool + migrations                      │
//! │   ├── bootstrap_admin()         only when no users exist               │
//! │   └── axum::serve()             until Ctrl+C / SIGTERM, then close pool │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stockroom_api::config::ApiConfig;
use stockroom_api::routes::users::bootstrap_admin;
use stockroom_api::{router, AppState};
use stockroom_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Stockroom API server...");

    let config = ApiConfig::load(None).context("Failed to load configuration")?;
    let db_path = config.database.database_path();
    info!(
        addr = %config.server.bind_address(),
        db = %db_path.display(),
        "Configuration loaded"
    );

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let db = Database::new(
        DbConfig::new(&db_path)
            .max_connections(config.database.max_connections)
            .default_location(config.inventory.default_location.clone()),
    )
    .await
    .context("Failed to open database")?;

    match bootstrap_admin(&db, &config.auth).await? {
        Some(admin) => info!(user = %admin.username, "Created bootstrap admin"),
        None if db.users().count().await? == 0 => {
            warn!("No users exist; set STOCKROOM_ADMIN_PASSWORD to create an admin")
        }
        None => {}
    }

    let addr = config.server.bind_address();
    let app = router(AppState::new(db.clone(), config));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockroom=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}

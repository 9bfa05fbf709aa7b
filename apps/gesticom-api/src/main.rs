//! # GestiCom API Entry Point
//!
//! ## Startup Sequence
//! 1. Initialize tracing
//! 2. Load configuration from the environment
//! 3. Open the database & run migrations
//! 4. Build state (Database, SaleEngine, CartStore)
//! 5. Serve until Ctrl+C / SIGTERM

use anyhow::Context;
use gesticom_api::{build_app, init_tracing, ApiConfig, AppState};
use gesticom_db::{Database, DbConfig};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ApiConfig::load().context("loading configuration")?;
    info!(
        bind_addr = %config.bind_addr,
        db_path = %config.db_path.display(),
        store = %config.store_name,
        "Starting GestiCom API"
    );

    let db = Database::new(
        DbConfig::new(config.db_path.clone()).max_connections(config.db_max_connections),
    )
    .await
    .context("opening database")?;
    info!("Database connected and migrations applied");

    let bind_addr = config.bind_addr;
    let state = AppState::new(db.clone(), config);
    let app = build_app(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    info!(%bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    db.close().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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

    info!("Shutdown signal received");
}

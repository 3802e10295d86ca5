//! # Storefront API
//!
//! HTTP server entry point.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Storefront Server                                │
//! │                                                                         │
//! │  Browser ───► HTTP (8080) ───► Routes ───► Services ───► SQLite        │
//! │                                               │                         │
//! │                                               ├────────► Redis          │
//! │                                               │          (carts)        │
//! │                                               └────────► PayPal         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::net::TcpListener;
use tracing::info;

use storefront_api::config::StorefrontConfig;
use storefront_api::{build_state, init_tracing, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Storefront API server...");

    let config = StorefrontConfig::load()?;
    let addr = config.server.address();
    info!(
        addr = %addr,
        database = %config.database.path.display(),
        currency = %config.store.currency,
        "Configuration loaded"
    );

    let state = build_state(config).await?;
    let app = router(state.clone());

    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

//! PrepNote Server
//!
//! Turns uploaded study documents into plain text and generates summaries
//! and presentation scripts from it.

use std::net::SocketAddr;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use prepnote_server::{app, logging, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(logging::env_filter(None))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = AppState::load().map_err(|e| {
        tracing::error!("Failed to start: {}", e);
        e
    })?;
    let config = state.config();

    tracing::info!(
        languages = %config.ocr.languages.join("+"),
        min_chars = config.extraction.min_chars,
        ocr_min_chars = config.extraction.ocr_min_chars,
        "Configuration loaded"
    );

    let addr: SocketAddr = config.server.bind_address.parse()?;
    let app = app(state);

    tracing::info!("Starting PrepNote server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}

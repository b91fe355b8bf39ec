//! Shutdown triggers.
//!
//! The server stops on Ctrl+C or when the [`Shutdown`](super::Shutdown)
//! broadcast fires, whichever comes first.

use tokio::sync::broadcast::{self, error::RecvError};

/// Resolves when the server should begin graceful shutdown.
pub async fn shutdown_signal(mut shutdown: broadcast::Receiver<()>) {
    let requested = async move {
        // A dropped coordinator is not a shutdown request.
        if let Err(RecvError::Closed) = shutdown.recv().await {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            match result {
                Ok(()) => tracing::info!("Shutdown signal received"),
                Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C"),
            }
        }
        _ = requested => {
            tracing::info!("Shutdown requested");
        }
    }
}

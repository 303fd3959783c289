//! Cooperative shutdown.
//!
//! SIGINT/SIGTERM cancel a root token; the HTTP server drains in-flight
//! requests and the worker loops stop pulling without acking in-flight
//! messages (the broker redelivers them on next boot).

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Spawn the signal listener and return the root cancellation token.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let root = token.clone();

    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!(error = %e, "failed to register ctrl-c handler");
                std::future::pending::<()>().await;
            }
        };

        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    error!(error = %e, "failed to register SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        tokio::select! {
            _ = ctrl_c => info!("SIGINT received, shutting down"),
            _ = terminate => info!("SIGTERM received, shutting down"),
        }
        root.cancel();
    });

    token
}

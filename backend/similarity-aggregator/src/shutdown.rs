//! Shutdown signalling for the consumer loop

use std::future::Future;
use tokio::sync::watch;
use tracing::{error, info};

/// Forward `signal` to a watch channel, flipping it to `true` once it fires
///
/// A signal that fails to register never triggers shutdown; the sender is
/// kept alive so receivers do not see a closed channel.
pub fn forward_shutdown<F>(signal: F) -> watch::Receiver<bool>
where
    F: Future<Output = std::io::Result<()>> + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = signal.await {
            error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    shutdown_rx
}

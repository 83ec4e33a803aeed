//! Graceful shutdown trigger for `serve`.

use std::future::Future;
use std::io;

use tracing::{info, warn};

/// Resolves once `signal` fires. If the listener cannot be installed the
/// future never resolves, so the server keeps running until it is killed.
pub async fn on_signal<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "cannot listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

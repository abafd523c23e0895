//! OS signal handling.
//!
//! Ctrl-C abandons any confirmation wait in progress. Transactions already
//! broadcast are not retracted; only the local wait stops.

use crate::lifecycle::Shutdown;

/// Trigger `shutdown` on the first Ctrl-C.
pub fn spawn_ctrl_c_handler(shutdown: Shutdown) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("Interrupt received, abandoning pending waits");
                shutdown.trigger();
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C"),
        }
    })
}

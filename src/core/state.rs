//! Process-wide shutdown state.
//!
//! Ctrl+C sets `SHUTDOWN` and wakes the watch loop through the registered
//! channel; a build in flight always runs to completion first.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc::UnboundedSender;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Install the Ctrl+C handler. Call once at program start.
///
/// Without a watch loop listening the process exits immediately; otherwise the
/// loop receives a message on `notify` and stops between builds.
pub fn setup_shutdown_handler(notify: Option<UnboundedSender<()>>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        SHUTDOWN.store(true, Ordering::SeqCst);
        match &notify {
            Some(tx) if tx.send(()).is_ok() => crate::log!("watch"; "shutting down..."),
            _ => std::process::exit(130),
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGHUP)
//! - Translate termination signals into shutdown
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP is acknowledged in the log only; reloads come from file changes

use tokio::task::JoinHandle;

use crate::lifecycle::Shutdown;

/// Spawn the signal listener. Returns once shutdown is triggered by any source.
pub fn spawn_signal_handler(shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = listen(&shutdown).await {
            tracing::error!(error = %e, "Failed to install signal handlers");
        }
    })
}

#[cfg(unix)]
async fn listen(shutdown: &Shutdown) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;

    loop {
        tokio::select! {
            _ = shutdown.triggered() => return Ok(()),
            _ = interrupt.recv() => {
                tracing::info!(signal = "SIGINT", "Shutdown signal received");
                break;
            }
            _ = terminate.recv() => {
                tracing::info!(signal = "SIGTERM", "Shutdown signal received");
                break;
            }
            _ = hangup.recv() => {
                tracing::info!(signal = "SIGHUP", "Signal received, ignoring");
            }
        }
    }

    shutdown.trigger();
    Ok(())
}

#[cfg(not(unix))]
async fn listen(shutdown: &Shutdown) -> std::io::Result<()> {
    tokio::select! {
        _ = shutdown.triggered() => return Ok(()),
        result = tokio::signal::ctrl_c() => result?,
    }
    tracing::info!("Shutdown signal received");
    shutdown.trigger();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn handler_exits_after_shutdown() {
        let shutdown = Shutdown::new();
        let handle = spawn_signal_handler(shutdown.clone());
        shutdown.trigger();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}

//! OS signal handling.
//!
//! - SIGINT / SIGTERM → graceful shutdown
//! - SIGHUP → reload redirection rules, keep serving

use std::sync::Arc;

use crate::lifecycle::shutdown::Shutdown;
use crate::redirection::RedirectStore;

/// Wait for signals until one asks for shutdown, then trigger it.
pub async fn handle_signals(shutdown: Arc<Shutdown>, redirects: Arc<RedirectStore>) {
    wait_for_shutdown_signal(&redirects).await;
    tracing::info!("Shutdown signal received");
    shutdown.trigger();
}

#[cfg(unix)]
async fn wait_for_shutdown_signal(redirects: &Arc<RedirectStore>) {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut terminate, mut hangup) = match (signal(SignalKind::terminate()), signal(SignalKind::hangup())) {
        (Ok(terminate), Ok(hangup)) => (terminate, hangup),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(error = %e, "Cannot install signal handlers, only Ctrl+C will stop the server");
            wait_for_ctrl_c().await;
            return;
        }
    };

    loop {
        tokio::select! {
            _ = wait_for_ctrl_c() => return,
            _ = terminate.recv() => return,
            _ = hangup.recv() => {
                tracing::info!("SIGHUP received, reloading redirection rules");
                let store = redirects.clone();
                if let Err(e) = tokio::task::spawn_blocking(move || store.reload()).await {
                    tracing::error!(error = %e, "Redirection reload task failed");
                }
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal(_redirects: &Arc<RedirectStore>) {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
}

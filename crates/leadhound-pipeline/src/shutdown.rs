// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal-driven shutdown for long-running commands.

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Installs handlers for SIGTERM and SIGINT (Ctrl+C).
///
/// The returned token is cancelled when either signal arrives. If a handler
/// cannot be installed the error is logged and the remaining signal still works.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        result = tokio::signal::ctrl_c() => log_ctrl_c(result),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    error!(error = %e, "failed to install SIGTERM handler");
                    log_ctrl_c(tokio::signal::ctrl_c().await);
                }
            }
        }

        #[cfg(not(unix))]
        log_ctrl_c(tokio::signal::ctrl_c().await);

        trigger.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

fn log_ctrl_c(result: std::io::Result<()>) {
    match result {
        Ok(()) => info!("received SIGINT (Ctrl+C), initiating shutdown"),
        Err(e) => error!(error = %e, "failed to listen for Ctrl+C, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_starts_uncancelled() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
    }
}

use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Cancels a shared token when the process is asked to stop.
#[derive(Debug)]
pub struct ShutdownGuard {
    token: CancellationToken,
}

impl ShutdownGuard {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Token observed by the input loop and the halt wait.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Spawn a task that cancels the token on SIGINT or SIGTERM (Ctrl+C elsewhere).
    pub fn spawn_signal_listener(&self) {
        let token = self.token.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            token.cancel();
        });
    }
}

impl Default for ShutdownGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use signal::unix::{SignalKind, signal as unix_signal};

    let mut sigterm = match unix_signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "failed to register SIGTERM handler");
            let _ = signal::ctrl_c().await;
            tracing::info!("received SIGINT, shutting down");
            return;
        }
    };
    tokio::select! {
        _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        _ = signal::ctrl_c() => tracing::info!("received SIGINT, shutting down"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("received Ctrl+C, shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tokens_share_cancellation() {
        let guard = ShutdownGuard::new();
        guard.spawn_signal_listener();
        let a = guard.token();
        let b = guard.token();
        assert!(!b.is_cancelled());
        a.cancel();
        b.cancelled().await;
        assert!(guard.token().is_cancelled());
    }
}

use std::time::Duration;

use crate::environment::clock::Sleeper;
use crate::environment::link::{Credentials, NetworkLink};
use crate::types::ConnectionState;

/// Owns the connection state and runs the bounded join loop.
///
/// Fixed interval, no backoff, no jitter. The state changes only inside
/// [`establish`](Self::establish).
#[derive(Debug)]
pub struct ConnectivityManager {
    state: ConnectionState,
}

impl ConnectivityManager {
    pub fn new() -> Self {
        Self { state: ConnectionState::Disconnected }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Begin joining, then check up to `max_attempts` times, sleeping
    /// `interval` before each check. Returns `Connected` or `Failed`.
    pub async fn establish(
        &mut self,
        link: &dyn NetworkLink,
        sleeper: &dyn Sleeper,
        credentials: &Credentials,
        max_attempts: u32,
        interval: Duration,
    ) -> ConnectionState {
        self.state = ConnectionState::Connecting;
        link.begin(credentials).await;

        for attempt in 1..=max_attempts {
            sleeper.sleep(interval).await;
            if link.is_connected().await {
                tracing::info!(attempt, ssid = %credentials.ssid, "network connected");
                self.state = ConnectionState::Connected;
                return self.state;
            }
            tracing::debug!(attempt, max_attempts, "network not yet reachable");
        }

        tracing::error!(
            attempts = max_attempts,
            interval_ms = interval.as_millis() as u64,
            "network connection failed"
        );
        self.state = ConnectionState::Failed;
        self.state
    }
}

impl Default for ConnectivityManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Link that becomes reachable on check number `up_after` (never if 0).
    struct ScriptedLink {
        up_after: u32,
        checks: AtomicU32,
        began: AtomicU32,
    }

    impl ScriptedLink {
        fn new(up_after: u32) -> Self {
            Self { up_after, checks: AtomicU32::new(0), began: AtomicU32::new(0) }
        }
    }

    #[async_trait::async_trait]
    impl NetworkLink for ScriptedLink {
        async fn begin(&self, _credentials: &Credentials) {
            self.began.fetch_add(1, Ordering::SeqCst);
        }

        async fn is_connected(&self) -> bool {
            let n = self.checks.fetch_add(1, Ordering::SeqCst) + 1;
            self.up_after != 0 && n >= self.up_after
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        sleeps: Mutex<Vec<Duration>>,
    }

    #[async_trait::async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
        }
    }

    fn creds() -> Credentials {
        Credentials::new("lab", "secret")
    }

    #[tokio::test]
    async fn unreachable_network_exhausts_budget() {
        let link = ScriptedLink::new(0);
        let sleeper = RecordingSleeper::default();
        let mut mgr = ConnectivityManager::new();
        assert_eq!(mgr.state(), ConnectionState::Disconnected);

        let state = mgr
            .establish(&link, &sleeper, &creds(), 20, Duration::from_millis(500))
            .await;

        assert_eq!(state, ConnectionState::Failed);
        assert_eq!(mgr.state(), ConnectionState::Failed);
        assert_eq!(link.checks.load(Ordering::SeqCst), 20);
        assert_eq!(link.began.load(Ordering::SeqCst), 1);
        let sleeps = sleeper.sleeps.lock().unwrap();
        assert_eq!(sleeps.len(), 20);
        assert!(sleeps.iter().all(|d| *d == Duration::from_millis(500)));
    }

    #[tokio::test]
    async fn stops_at_first_successful_check() {
        let link = ScriptedLink::new(3);
        let sleeper = RecordingSleeper::default();
        let mut mgr = ConnectivityManager::new();

        let state = mgr
            .establish(&link, &sleeper, &creds(), 20, Duration::from_millis(500))
            .await;

        assert_eq!(state, ConnectionState::Connected);
        assert_eq!(link.checks.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.sleeps.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn zero_budget_fails_without_checking() {
        let link = ScriptedLink::new(1);
        let sleeper = RecordingSleeper::default();
        let mut mgr = ConnectivityManager::new();

        let state = mgr
            .establish(&link, &sleeper, &creds(), 0, Duration::from_millis(500))
            .await;

        assert_eq!(state, ConnectionState::Failed);
        assert_eq!(link.checks.load(Ordering::SeqCst), 0);
    }
}

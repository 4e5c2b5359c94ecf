use std::time::Duration;

use tokio::net::TcpStream;

/// Network join credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: String,
    password: String,
}

impl Credentials {
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self { ssid: ssid.into(), password: password.into() }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("ssid", &self.ssid)
            .field("password", &"********")
            .finish()
    }
}

/// The network interface the connectivity manager drives.
#[async_trait::async_trait]
pub trait NetworkLink: Send + Sync {
    /// Start joining the network. Returns immediately; progress is observed via `is_connected`.
    async fn begin(&self, credentials: &Credentials);

    /// One reachability check.
    async fn is_connected(&self) -> bool;
}

/// Host link. A host has no radio to associate, so reachability of the
/// inference service endpoint stands in for having joined the network.
#[derive(Debug, Clone)]
pub struct HostLink {
    host: String,
    port: u16,
    check_timeout: Duration,
}

impl HostLink {
    pub fn new(host: impl Into<String>, port: u16, check_timeout: Duration) -> Self {
        Self { host: host.into(), port, check_timeout }
    }
}

#[async_trait::async_trait]
impl NetworkLink for HostLink {
    async fn begin(&self, credentials: &Credentials) {
        tracing::info!(ssid = %credentials.ssid, host = %self.host, port = self.port, "joining network");
    }

    async fn is_connected(&self) -> bool {
        let addr = (self.host.as_str(), self.port);
        match tokio::time::timeout(self.check_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "link check failed");
                false
            }
            Err(_) => false,
        }
    }
}

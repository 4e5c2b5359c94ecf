//! reqwest-backed transport for OpenAI-compatible chat-completions servers
//! (LM Studio, llama.cpp server, vLLM and friends).

use crate::provider::{ChatTransport, RawResponse, TransportError};
use reqwest::header::CONTENT_TYPE;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Path appended to `{scheme}://{host}:{port}`.
pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Build the completions endpoint from its parts.
pub fn endpoint_url(scheme: &str, host: &str, port: u16) -> String {
    format!("{scheme}://{host}:{port}{COMPLETIONS_PATH}")
}

/// Single-attempt HTTP transport with a connect timeout and an overall timeout.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(
        scheme: &str,
        host: &str,
        port: u16,
        connect_timeout: Duration,
        total_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(total_timeout)
            .build()?;
        Ok(Self { client, endpoint: endpoint_url(scheme, host, port) })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post_once(&self, body: String) -> Result<RawResponse, TransportError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            // Body of a failed exchange is never parsed.
            return Ok(RawResponse { status, body: String::new() });
        }
        let body = resp.text().await.map_err(classify)?;
        Ok(RawResponse { status, body })
    }
}

/// Map a reqwest failure to its transport code class.
fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::TimedOut
    } else if e.is_connect() {
        TransportError::ConnectFailed(e.to_string())
    } else {
        TransportError::SendFailed(e.to_string())
    }
}

impl ChatTransport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    fn post(
        &self,
        body: String,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + Send + '_>> {
        tracing::debug!(endpoint = %self.endpoint, bytes = body.len(), "POST");
        Box::pin(self.post_once(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(scheme: &str, host: &str, port: u16) -> HttpTransport {
        HttpTransport::new(scheme, host, port, Duration::from_secs(10), Duration::from_secs(60)).unwrap()
    }

    #[test]
    fn lan_endpoint() {
        let t = transport("http", "192.168.45.160", 1234);
        assert_eq!(t.endpoint(), "http://192.168.45.160:1234/v1/chat/completions");
        assert_eq!(t.name(), "http");
    }

    #[test]
    fn https_endpoint() {
        assert_eq!(
            endpoint_url("https", "inference.local", 8443),
            "https://inference.local:8443/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        // Port 9 (discard) on loopback is closed on any sane test host.
        let t = HttpTransport::new(
            "http",
            "127.0.0.1",
            9,
            Duration::from_millis(500),
            Duration::from_secs(2),
        )
        .unwrap();
        let err = t.post("{}".into()).await.unwrap_err();
        assert!(err.code() < 0, "unexpected {err:?}");
    }
}

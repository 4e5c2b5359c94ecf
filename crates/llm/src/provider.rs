use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// Transport-layer codes reported in place of an HTTP status.
/// Negative so they can never collide with a real status.
pub const CODE_CONNECT_FAILED: i32 = -1;
pub const CODE_SEND_FAILED: i32 = -3;
pub const CODE_NOT_CONNECTED: i32 = -4;
pub const CODE_REQUEST_TOO_LARGE: i32 = -8;
pub const CODE_TIMED_OUT: i32 = -11;

/// JSON path of the completion text, used in error messages.
pub const CONTENT_PATH: &str = "choices[0].message.content";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

/// A single message in the request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Wire body for `POST /v1/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    /// Single-turn request carrying one user message.
    pub fn single_turn(model: impl Into<String>, prompt: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage { role: Role::User, content: prompt.into() }],
            temperature,
            max_tokens,
        }
    }

    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Status line and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure below the HTTP layer. Each variant maps to a stable negative code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectFailed(String),
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("network not connected")]
    NotConnected,
    #[error("request of {size} bytes exceeds {limit}-byte buffer")]
    RequestTooLarge { size: usize, limit: usize },
    #[error("timed out")]
    TimedOut,
}

impl TransportError {
    pub fn code(&self) -> i32 {
        match self {
            Self::ConnectFailed(_) => CODE_CONNECT_FAILED,
            Self::SendFailed(_) => CODE_SEND_FAILED,
            Self::NotConnected => CODE_NOT_CONNECTED,
            Self::RequestTooLarge { .. } => CODE_REQUEST_TOO_LARGE,
            Self::TimedOut => CODE_TIMED_OUT,
        }
    }
}

/// Human-readable form of an outcome code: an HTTP status or a transport code.
pub fn describe_code(code: i32) -> String {
    let reason = match code {
        CODE_CONNECT_FAILED => "connection failed",
        CODE_SEND_FAILED => "send failed",
        CODE_NOT_CONNECTED => "not connected",
        CODE_REQUEST_TOO_LARGE => "request exceeds buffer",
        CODE_TIMED_OUT => "timed out",
        c if c >= 0 => return format!("HTTP {c}"),
        _ => "unknown",
    };
    format!("Transport error {code} ({reason})")
}

/// Why a success-status body could not be turned into completion text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFailure {
    #[error("response of {size} bytes exceeds {limit}-byte buffer")]
    Overflow { size: usize, limit: usize },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("missing field {0}")]
    FieldMissing(&'static str),
}

/// Extract `choices[0].message.content` from a response body.
///
/// The body must fit `limit` bytes, parse as JSON, and carry the content as a
/// string. Each requirement fails with its own [`ParseFailure`].
pub fn extract_content(body: &str, limit: usize) -> Result<String, ParseFailure> {
    if body.len() > limit {
        return Err(ParseFailure::Overflow { size: body.len(), limit });
    }
    let doc: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ParseFailure::Malformed(e.to_string()))?;
    doc.pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .ok_or(ParseFailure::FieldMissing(CONTENT_PATH))
}

/// One-shot POST of a pre-serialized request body.
pub trait ChatTransport: Send + Sync {
    fn name(&self) -> &str;

    fn post(
        &self,
        body: String,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + Send + '_>>;
}

impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn post(
        &self,
        body: String,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + Send + '_>> {
        (**self).post(body)
    }
}

/// Test transport: returns a fixed reply and records every body it was sent.
#[derive(Debug)]
pub struct MockTransport {
    reply: Result<RawResponse, TransportError>,
    sent: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new(reply: Result<RawResponse, TransportError>) -> Self {
        Self { reply, sent: Mutex::new(Vec::new()) }
    }

    /// 200 with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::new(Ok(RawResponse { status, body: body.into() }))
    }

    /// 200 carrying a well-formed completion with `content`.
    pub fn completion(content: &str) -> Self {
        let body = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        });
        Self::ok(body.to_string())
    }

    pub fn failing(err: TransportError) -> Self {
        Self::new(Err(err))
    }

    /// Bodies posted so far, oldest first.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl ChatTransport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    fn post(
        &self,
        body: String,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + Send + '_>> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(body);
        }
        let reply = self.reply.clone();
        Box::pin(async move { reply })
    }
}

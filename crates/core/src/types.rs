use beacon_llm::provider::{ChatRequest, ParseFailure, TransportError};
use serde::{Deserialize, Serialize};

/// Buffer sizing tier selected by the capability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizingTier {
    /// No usable expanded memory; small request/response buffers.
    Constrained,
    /// Expanded memory proven writable; large buffers.
    Expanded,
}

impl std::fmt::Display for SizingTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constrained => write!(f, "constrained"),
            Self::Expanded => write!(f, "expanded"),
        }
    }
}

/// Buffer sizes chosen at boot. Immutable once the probe has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityProfile {
    pub expanded_memory_available: bool,
    pub request_buffer_bytes: usize,
    pub response_buffer_bytes: usize,
}

impl CapabilityProfile {
    pub fn tier(&self) -> SizingTier {
        if self.expanded_memory_available {
            SizingTier::Expanded
        } else {
            SizingTier::Constrained
        }
    }
}

/// Network reachability as seen by the connectivity manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl ConnectionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Connected | Self::Failed)
    }
}

/// One prompt as it leaves the device. Built per submission, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub prompt: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&QueryRequest> for ChatRequest {
    fn from(q: &QueryRequest) -> Self {
        ChatRequest::single_turn(q.model.clone(), q.prompt.clone(), q.temperature, q.max_tokens)
    }
}

/// Classified result of one submission. Exactly one per `submit()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Success { content: String },
    ParseError { message: String },
    /// HTTP status for non-success replies, negative transport code otherwise.
    TransportError { code: i32 },
}

impl QueryOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Success { .. } => OutcomeKind::Success,
            Self::ParseError { .. } => OutcomeKind::ParseError,
            Self::TransportError { .. } => OutcomeKind::TransportError,
        }
    }
}

impl From<TransportError> for QueryOutcome {
    fn from(e: TransportError) -> Self {
        Self::TransportError { code: e.code() }
    }
}

impl From<ParseFailure> for QueryOutcome {
    fn from(e: ParseFailure) -> Self {
        Self::ParseError { message: e.to_string() }
    }
}

/// Payload-free tag of a [`QueryOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeKind {
    Success,
    ParseError,
    TransportError,
}

/// Wrapped text ready for a fixed-size display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFrame {
    pub title: String,
    pub body_lines: Vec<String>,
    pub truncated: bool,
}

/// A single tone of the audio feedback channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneEvent {
    pub frequency_hz: u32,
    pub duration_ms: u32,
}

/// Pipeline-level lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Probing,
    Connecting,
    /// Connected and waiting for input.
    Ready,
    /// Connectivity failed; input is accepted and answered with transport errors.
    Degraded,
    Submitting,
    Rendering,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_follows_expanded_flag() {
        let p = CapabilityProfile {
            expanded_memory_available: true,
            request_buffer_bytes: 8192,
            response_buffer_bytes: 16384,
        };
        assert_eq!(p.tier(), SizingTier::Expanded);
        assert!(SizingTier::Constrained < SizingTier::Expanded);
    }

    #[test]
    fn terminal_connection_states() {
        assert!(ConnectionState::Connected.is_terminal());
        assert!(ConnectionState::Failed.is_terminal());
        assert!(!ConnectionState::Connecting.is_terminal());
        assert!(!ConnectionState::Disconnected.is_terminal());
    }

    #[test]
    fn outcome_from_llm_errors() {
        assert_eq!(
            QueryOutcome::from(TransportError::TimedOut),
            QueryOutcome::TransportError { code: -11 }
        );
        let o = QueryOutcome::from(ParseFailure::Malformed("eof".into()));
        assert_eq!(o.kind(), OutcomeKind::ParseError);
    }
}

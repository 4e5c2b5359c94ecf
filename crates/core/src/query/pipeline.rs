use beacon_llm::provider::{ChatRequest, ChatTransport, TransportError, extract_content};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::BeaconCfg;
use crate::query::bound::truncate_to_escaped;
use crate::types::{CapabilityProfile, QueryOutcome, QueryRequest};

/// Chars of the raw response echoed to the debug log.
pub const RESPONSE_PREVIEW_CHARS: usize = 200;

/// Prompt → request → one POST → classified outcome.
///
/// Buffers are sized from the [`CapabilityProfile`] handed in at construction,
/// so the pipeline can only exist after the probe has run.
pub struct QueryPipeline {
    transport: Box<dyn ChatTransport>,
    profile: CapabilityProfile,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl QueryPipeline {
    pub fn new(transport: Box<dyn ChatTransport>, profile: CapabilityProfile, cfg: &BeaconCfg) -> Self {
        Self {
            transport,
            profile,
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        }
    }

    pub fn profile(&self) -> &CapabilityProfile {
        &self.profile
    }

    pub fn build_request(&self, prompt: &str) -> QueryRequest {
        QueryRequest {
            prompt: prompt.to_owned(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Escaped prompt bytes the active request buffer can hold.
    pub fn max_prompt_bytes(&self) -> usize {
        let envelope = ChatRequest::from(&self.build_request(""))
            .to_payload()
            .map(|p| p.len())
            .unwrap_or(self.profile.request_buffer_bytes);
        self.profile.request_buffer_bytes.saturating_sub(envelope)
    }

    /// Longest prefix of `prompt` that serializes within the request buffer.
    pub fn bound_prompt<'a>(&self, prompt: &'a str) -> &'a str {
        truncate_to_escaped(prompt, self.max_prompt_bytes())
    }

    /// Issue exactly one request for `prompt` and classify the result.
    pub async fn submit(&self, prompt: &str) -> QueryOutcome {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("submit", %request_id, transport = self.transport.name());
        self.submit_inner(prompt).instrument(span).await
    }

    async fn submit_inner(&self, prompt: &str) -> QueryOutcome {
        let request = self.build_request(prompt);
        let payload = match ChatRequest::from(&request).to_payload() {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "request serialization failed");
                return TransportError::SendFailed(e.to_string()).into();
            }
        };

        let limit = self.profile.request_buffer_bytes;
        if payload.len() > limit {
            tracing::error!(size = payload.len(), limit, "request exceeds tier buffer");
            return TransportError::RequestTooLarge { size: payload.len(), limit }.into();
        }
        tracing::info!(prompt = %request.prompt, "sending request");
        tracing::debug!(body = %payload, "request body");

        let response = match self.transport.post(payload).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, "request failed");
                return e.into();
            }
        };

        if !response.is_success() {
            tracing::warn!(status = response.status, "request failed");
            return QueryOutcome::TransportError { code: i32::from(response.status) };
        }

        let preview: String = response.body.chars().take(RESPONSE_PREVIEW_CHARS).collect();
        tracing::debug!(bytes = response.body.len(), preview = %preview, "raw response");

        match extract_content(&response.body, self.profile.response_buffer_bytes) {
            Ok(content) => {
                tracing::info!(chars = content.chars().count(), "reply received");
                QueryOutcome::Success { content }
            }
            Err(e) => {
                tracing::warn!(error = %e, "response rejected");
                e.into()
            }
        }
    }
}

use beacon_llm::provider::{ChatTransport, TransportError};

use crate::boot::{ConnectivityManager, probe};
use crate::config::{BeaconCfg, ConnectivityPolicy};
use crate::environment::clock::Sleeper;
use crate::environment::link::NetworkLink;
use crate::environment::memory::MemoryPool;
use crate::query::QueryPipeline;
use crate::render::{RenderSummary, ResponseRenderer, TITLE_REQUEST_FAILED};
use crate::types::{CapabilityProfile, ConnectionState, QueryOutcome, SessionState};

#[derive(Debug, thiserror::Error)]
pub enum BootError {
    #[error("network unreachable after {attempts} attempts")]
    ConnectivityFailure { attempts: u32 },
}

/// Host collaborators consulted only while booting.
pub struct BootEnv<'a> {
    pub memory: &'a dyn MemoryPool,
    pub link: &'a dyn NetworkLink,
    pub sleeper: &'a dyn Sleeper,
}

/// One booted beacon: sized pipeline, connection state and feedback channels.
///
/// Built only through [`Session::boot`], so the probe always runs before the
/// pipeline is sized and the link is always established before a request.
/// `&mut self` on [`handle_line`](Self::handle_line) keeps one request in flight.
pub struct Session {
    state: SessionState,
    pipeline: QueryPipeline,
    connectivity: ConnectivityManager,
    renderer: ResponseRenderer,
    boot_prompt: Option<String>,
}

impl Session {
    /// Probe, connect, then settle in `Ready` or `Degraded`.
    ///
    /// A failed connect under [`ConnectivityPolicy::Halt`] is reported on every
    /// channel and returned as [`BootError::ConnectivityFailure`].
    pub async fn boot(
        cfg: &BeaconCfg,
        env: BootEnv<'_>,
        transport: Box<dyn ChatTransport>,
        mut renderer: ResponseRenderer,
    ) -> Result<Self, BootError> {
        tracing::info!(state = ?SessionState::Probing, "session state");
        let profile = probe(env.memory, cfg);

        tracing::info!(state = ?SessionState::Connecting, "session state");
        let mut connectivity = ConnectivityManager::new();
        let connection = connectivity
            .establish(
                env.link,
                env.sleeper,
                &cfg.credentials(),
                cfg.connect_attempts,
                cfg.connect_interval(),
            )
            .await;

        let state = match connection {
            ConnectionState::Connected => SessionState::Ready,
            _ => {
                let notice = format!("Network unreachable after {} attempts", cfg.connect_attempts);
                renderer.notify(TITLE_REQUEST_FAILED, &notice);
                if cfg.connectivity_policy == ConnectivityPolicy::Halt {
                    return Err(BootError::ConnectivityFailure { attempts: cfg.connect_attempts });
                }
                tracing::warn!(policy = %cfg.connectivity_policy, "continuing without network");
                SessionState::Degraded
            }
        };
        tracing::info!(state = ?state, tier = %profile.tier(), "session state");

        Ok(Self {
            state,
            pipeline: QueryPipeline::new(transport, profile, cfg),
            connectivity,
            renderer,
            boot_prompt: cfg.boot_prompt.clone(),
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn profile(&self) -> &CapabilityProfile {
        self.pipeline.profile()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connectivity.state()
    }

    /// Submit the configured greeting once. Only a `Ready` session greets.
    pub async fn greet(&mut self) -> Option<RenderSummary> {
        if self.state != SessionState::Ready {
            return None;
        }
        let prompt = self.boot_prompt.take()?;
        tracing::info!("sending boot prompt");
        self.handle_line(&prompt).await
    }

    /// Run one input line through submit and render. Blank lines are ignored.
    pub async fn handle_line(&mut self, line: &str) -> Option<RenderSummary> {
        let prompt = line.trim();
        if prompt.is_empty() {
            return None;
        }
        let settled = self.state;

        self.transition(SessionState::Submitting);
        let outcome = if settled == SessionState::Degraded {
            QueryOutcome::from(TransportError::NotConnected)
        } else {
            let bounded = self.pipeline.bound_prompt(prompt);
            if bounded.len() < prompt.len() {
                tracing::warn!(
                    original_bytes = prompt.len(),
                    kept_bytes = bounded.len(),
                    "prompt truncated to fit request buffer"
                );
            }
            self.pipeline.submit(bounded).await
        };

        self.transition(SessionState::Rendering);
        let summary = self.renderer.render(outcome);

        self.transition(settled);
        Some(summary)
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(from = ?self.state, to = ?next, "session state");
        self.state = next;
    }
}

mod audio;
mod console;
mod panel;

use std::fs::File;
use std::io::BufWriter;

use anyhow::Context;
use beacon_core::config::BeaconCfg;
use beacon_core::environment::clock::TokioSleeper;
use beacon_core::environment::link::HostLink;
use beacon_core::environment::memory::HostMemory;
use beacon_core::render::{ResponseRenderer, ToneSink};
use beacon_core::runtime::{BootEnv, BootError, Session, ShutdownGuard};
use beacon_llm::http::HttpTransport;
use beacon_llm::provider::ChatTransport;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::audio::{PcmToneSink, ToneLog};
use crate::panel::TerminalPanel;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cfg = BeaconCfg::from_env().context("invalid BEACON_* configuration")?;
    for (key, value, description) in cfg.to_entries() {
        tracing::debug!(key, value = %value, description, "config");
    }

    let guard = ShutdownGuard::new();
    guard.spawn_signal_listener();
    let token = guard.token();

    let transport = HttpTransport::new(
        &cfg.service_scheme,
        &cfg.service_host,
        cfg.service_port,
        cfg.connect_timeout(),
        cfg.total_timeout(),
    )
    .context("failed to build HTTP client")?;
    tracing::info!(name = transport.name(), endpoint = transport.endpoint(), "inference service");

    let renderer = build_renderer(&cfg)?;
    let link = HostLink::new(cfg.service_host.clone(), cfg.service_port, cfg.link_check_timeout());
    let env = BootEnv { memory: &HostMemory, link: &link, sleeper: &TokioSleeper };

    let booted = tokio::select! {
        _ = token.cancelled() => return Ok(()),
        booted = Session::boot(&cfg, env, Box::new(transport), renderer) => booted,
    };
    let mut session = match booted {
        Ok(session) => session,
        Err(e @ BootError::ConnectivityFailure { .. }) => {
            tracing::error!(error = %e, "halted; waiting for termination signal");
            token.cancelled().await;
            return Ok(());
        }
    };

    tokio::select! {
        _ = token.cancelled() => return Ok(()),
        _ = session.greet() => {}
    }
    console::run(&mut session, &token).await?;
    tracing::info!("beacon stopped");
    Ok(())
}

/// Human-readable logs on stderr, or JSON to `BEACON_LOG_FILE` when set.
fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match std::env::var("BEACON_LOG_FILE") {
        Ok(path) if !path.is_empty() => {
            let file = File::create(&path).with_context(|| format!("cannot open log file {path}"))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(true).with_writer(file))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

fn build_renderer(cfg: &BeaconCfg) -> anyhow::Result<ResponseRenderer> {
    let mut renderer = ResponseRenderer::from_cfg(cfg);
    if cfg.has_display {
        renderer = renderer.with_display(Box::new(TerminalPanel::new(
            std::io::stdout(),
            cfg.display_width,
            cfg.display_lines,
        )));
    }
    if cfg.has_audio {
        let sink: Box<dyn ToneSink> = match &cfg.pcm_out {
            Some(path) => {
                let file = File::create(path).with_context(|| format!("cannot open PCM output {path}"))?;
                tracing::info!(path = %path, sample_rate = cfg.pcm_sample_rate, "writing tones as PCM");
                Box::new(PcmToneSink::new(BufWriter::new(file), cfg.pcm_sample_rate))
            }
            None => Box::new(ToneLog),
        };
        renderer = renderer.with_audio(sink);
    }
    Ok(renderer)
}

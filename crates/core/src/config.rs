use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::environment::link::Credentials;
use crate::types::{CapabilityProfile, SizingTier};

/// Prefix of every recognized environment variable.
pub const ENV_PREFIX: &str = "BEACON_";

/// Greeting submitted once after a successful connect.
pub const DEFAULT_BOOT_PROMPT: &str = "Hello, introduce yourself in one sentence.";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown connectivity policy '{0}' (expected 'degrade' or 'halt')")]
    UnknownPolicy(String),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("tone band {base_hz} Hz + {band_hz} Hz exceeds the frequency range")]
    ToneRange { base_hz: u32, band_hz: u32 },
    #[error("expanded tier ({expanded} bytes) is smaller than constrained tier ({constrained} bytes) for {buffer}")]
    TierOrder {
        buffer: &'static str,
        constrained: usize,
        expanded: usize,
    },
}

/// What to do once the connect budget is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityPolicy {
    /// Report the failure and keep accepting input offline.
    #[default]
    Degrade,
    /// Block forever; only a termination signal ends the process.
    Halt,
}

impl FromStr for ConnectivityPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "degrade" => Ok(Self::Degrade),
            "halt" => Ok(Self::Halt),
            other => Err(ConfigError::UnknownPolicy(other.to_owned())),
        }
    }
}

impl std::fmt::Display for ConnectivityPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Degrade => write!(f, "degrade"),
            Self::Halt => write!(f, "halt"),
        }
    }
}

/// All beacon parameters. Resolved once at startup from `BEACON_*`
/// environment variables; immutable for the process lifetime.
#[derive(Clone)]
pub struct BeaconCfg {
    // network join
    pub wifi_ssid: String,
    pub wifi_password: String,
    pub connect_attempts: u32,
    pub connect_interval_ms: u64,
    pub link_check_timeout_ms: u64,
    pub connectivity_policy: ConnectivityPolicy,

    // inference service
    pub service_scheme: String,
    pub service_host: String,
    pub service_port: u16,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub connect_timeout_ms: u64,
    pub total_timeout_ms: u64,

    // sizing tiers
    pub probe_block_bytes: usize,
    pub constrained_request_bytes: usize,
    pub constrained_response_bytes: usize,
    pub expanded_request_bytes: usize,
    pub expanded_response_bytes: usize,

    // display
    pub has_display: bool,
    pub display_width: usize,
    pub display_lines: usize,

    // audio
    pub has_audio: bool,
    pub tone_base_hz: u32,
    pub tone_band_hz: u32,
    pub tone_ms: u32,
    pub tone_gap_ms: u32,
    pub tone_prefix: usize,
    pub pcm_out: Option<String>,
    pub pcm_sample_rate: u32,

    pub boot_prompt: Option<String>,
}

impl Default for BeaconCfg {
    fn default() -> Self {
        Self {
            wifi_ssid: String::new(),
            wifi_password: String::new(),
            connect_attempts: 20,
            connect_interval_ms: 500,
            link_check_timeout_ms: 500,
            connectivity_policy: ConnectivityPolicy::Degrade,
            service_scheme: "http".into(),
            service_host: "127.0.0.1".into(),
            service_port: 1234,
            model: "qwen/qwen3-v1-30b".into(),
            temperature: 0.7,
            max_tokens: 1024,
            connect_timeout_ms: 10_000,
            total_timeout_ms: 60_000,
            probe_block_bytes: 6 * 1024 * 1024,
            constrained_request_bytes: 2048,
            constrained_response_bytes: 4096,
            expanded_request_bytes: 8192,
            expanded_response_bytes: 16384,
            has_display: true,
            display_width: 26,
            display_lines: 18,
            has_audio: true,
            tone_base_hz: 400,
            tone_band_hz: 1200,
            tone_ms: 60,
            tone_gap_ms: 20,
            tone_prefix: 32,
            pcm_out: None,
            pcm_sample_rate: 16_000,
            boot_prompt: Some(DEFAULT_BOOT_PROMPT.into()),
        }
    }
}

// Manual impl keeps the password out of logs.
impl std::fmt::Debug for BeaconCfg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut d = f.debug_struct("BeaconCfg");
        for (key, value, _) in self.to_entries() {
            d.field(key, &value);
        }
        d.finish()
    }
}

impl BeaconCfg {
    /// Load from the process environment. Unset or unparsable values keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let map: HashMap<String, String> = std::env::vars()
            .filter_map(|(k, v)| {
                k.strip_prefix(ENV_PREFIX)
                    .map(|key| (key.to_ascii_lowercase(), v))
            })
            .collect();
        Self::from_map(&map)
    }

    /// Build from a lowercase key map (`service_host`, `display_width`, ...), then validate.
    pub fn from_map(m: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let d = Self::default();
        let connectivity_policy = match m.get("connectivity_policy") {
            Some(v) => v.parse()?,
            None => d.connectivity_policy,
        };
        let cfg = Self {
            wifi_ssid: get_or(m, "wifi_ssid", d.wifi_ssid),
            wifi_password: get_or(m, "wifi_password", d.wifi_password),
            connect_attempts: get_or(m, "connect_attempts", d.connect_attempts),
            connect_interval_ms: get_or(m, "connect_interval_ms", d.connect_interval_ms),
            link_check_timeout_ms: get_or(m, "link_check_timeout_ms", d.link_check_timeout_ms),
            connectivity_policy,
            service_scheme: get_or(m, "service_scheme", d.service_scheme),
            service_host: get_or(m, "service_host", d.service_host),
            service_port: get_or(m, "service_port", d.service_port),
            model: get_or(m, "model", d.model),
            temperature: get_or(m, "temperature", d.temperature),
            max_tokens: get_or(m, "max_tokens", d.max_tokens),
            connect_timeout_ms: get_or(m, "connect_timeout_ms", d.connect_timeout_ms),
            total_timeout_ms: get_or(m, "total_timeout_ms", d.total_timeout_ms),
            probe_block_bytes: get_or(m, "probe_block_bytes", d.probe_block_bytes),
            constrained_request_bytes: get_or(m, "constrained_request_bytes", d.constrained_request_bytes),
            constrained_response_bytes: get_or(m, "constrained_response_bytes", d.constrained_response_bytes),
            expanded_request_bytes: get_or(m, "expanded_request_bytes", d.expanded_request_bytes),
            expanded_response_bytes: get_or(m, "expanded_response_bytes", d.expanded_response_bytes),
            has_display: get_flag(m, "has_display", d.has_display),
            display_width: get_or(m, "display_width", d.display_width),
            display_lines: get_or(m, "display_lines", d.display_lines),
            has_audio: get_flag(m, "has_audio", d.has_audio),
            tone_base_hz: get_or(m, "tone_base_hz", d.tone_base_hz),
            tone_band_hz: get_or(m, "tone_band_hz", d.tone_band_hz),
            tone_ms: get_or(m, "tone_ms", d.tone_ms),
            tone_gap_ms: get_or(m, "tone_gap_ms", d.tone_gap_ms),
            tone_prefix: get_or(m, "tone_prefix", d.tone_prefix),
            pcm_out: get_opt(m, "pcm_out").or(d.pcm_out),
            pcm_sample_rate: get_or(m, "pcm_sample_rate", d.pcm_sample_rate),
            boot_prompt: match m.get("boot_prompt") {
                Some(v) if v.trim().is_empty() => None,
                Some(v) => Some(v.trim().to_owned()),
                None => d.boot_prompt,
            },
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let nonzero = [
            ("display_width", self.display_width),
            ("display_lines", self.display_lines),
            ("tone_band_hz", self.tone_band_hz as usize),
            ("pcm_sample_rate", self.pcm_sample_rate as usize),
            ("constrained_request_bytes", self.constrained_request_bytes),
            ("constrained_response_bytes", self.constrained_response_bytes),
        ];
        if let Some(&(name, _)) = nonzero.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Zero(name));
        }
        if self.tone_base_hz.checked_add(self.tone_band_hz).is_none() {
            return Err(ConfigError::ToneRange { base_hz: self.tone_base_hz, band_hz: self.tone_band_hz });
        }
        if self.expanded_request_bytes < self.constrained_request_bytes {
            return Err(ConfigError::TierOrder {
                buffer: "request",
                constrained: self.constrained_request_bytes,
                expanded: self.expanded_request_bytes,
            });
        }
        if self.expanded_response_bytes < self.constrained_response_bytes {
            return Err(ConfigError::TierOrder {
                buffer: "response",
                constrained: self.constrained_response_bytes,
                expanded: self.expanded_response_bytes,
            });
        }
        Ok(())
    }

    /// Buffer sizes for a tier.
    pub fn profile_for(&self, tier: SizingTier) -> CapabilityProfile {
        match tier {
            SizingTier::Constrained => CapabilityProfile {
                expanded_memory_available: false,
                request_buffer_bytes: self.constrained_request_bytes,
                response_buffer_bytes: self.constrained_response_bytes,
            },
            SizingTier::Expanded => CapabilityProfile {
                expanded_memory_available: true,
                request_buffer_bytes: self.expanded_request_bytes,
                response_buffer_bytes: self.expanded_response_bytes,
            },
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.wifi_ssid.clone(), self.wifi_password.clone())
    }

    pub fn connect_interval(&self) -> Duration {
        Duration::from_millis(self.connect_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn total_timeout(&self) -> Duration {
        Duration::from_millis(self.total_timeout_ms)
    }

    pub fn link_check_timeout(&self) -> Duration {
        Duration::from_millis(self.link_check_timeout_ms)
    }

    /// Key, value, description triples for the startup diagnostic dump.
    /// The password is masked.
    pub fn to_entries(&self) -> Vec<(&str, String, &str)> {
        let masked = if self.wifi_password.is_empty() { "" } else { "********" };
        vec![
            ("wifi_ssid", self.wifi_ssid.clone(), "Network name to join"),
            ("wifi_password", masked.to_owned(), "Network passphrase"),
            ("connect_attempts", self.connect_attempts.to_string(), "Reachability checks before giving up"),
            ("connect_interval_ms", self.connect_interval_ms.to_string(), "Fixed wait before each check"),
            ("link_check_timeout_ms", self.link_check_timeout_ms.to_string(), "Timeout of a single check"),
            ("connectivity_policy", self.connectivity_policy.to_string(), "degrade or halt on connect failure"),
            ("service_scheme", self.service_scheme.clone(), "Inference service scheme"),
            ("service_host", self.service_host.clone(), "Inference service host"),
            ("service_port", self.service_port.to_string(), "Inference service port"),
            ("model", self.model.clone(), "Model identifier"),
            ("temperature", self.temperature.to_string(), "Sampling temperature"),
            ("max_tokens", self.max_tokens.to_string(), "Completion token cap"),
            ("connect_timeout_ms", self.connect_timeout_ms.to_string(), "HTTP connect timeout"),
            ("total_timeout_ms", self.total_timeout_ms.to_string(), "HTTP overall timeout"),
            ("probe_block_bytes", self.probe_block_bytes.to_string(), "Expanded-memory test block"),
            ("constrained_request_bytes", self.constrained_request_bytes.to_string(), "Request buffer, constrained tier"),
            ("constrained_response_bytes", self.constrained_response_bytes.to_string(), "Response buffer, constrained tier"),
            ("expanded_request_bytes", self.expanded_request_bytes.to_string(), "Request buffer, expanded tier"),
            ("expanded_response_bytes", self.expanded_response_bytes.to_string(), "Response buffer, expanded tier"),
            ("has_display", self.has_display.to_string(), "Text display channel enabled"),
            ("display_width", self.display_width.to_string(), "Display line width in chars"),
            ("display_lines", self.display_lines.to_string(), "Display line capacity"),
            ("has_audio", self.has_audio.to_string(), "Tone channel enabled"),
            ("tone_base_hz", self.tone_base_hz.to_string(), "Lowest tone frequency"),
            ("tone_band_hz", self.tone_band_hz.to_string(), "Tone band width"),
            ("tone_ms", self.tone_ms.to_string(), "Duration of each tone"),
            ("tone_gap_ms", self.tone_gap_ms.to_string(), "Silence between tones"),
            ("tone_prefix", self.tone_prefix.to_string(), "Chars sonified per reply"),
            ("pcm_out", self.pcm_out.clone().unwrap_or_default(), "Raw PCM output file"),
            ("pcm_sample_rate", self.pcm_sample_rate.to_string(), "PCM sample rate"),
            ("boot_prompt", self.boot_prompt.clone().unwrap_or_default(), "Greeting sent after connect"),
        ]
    }
}

fn get_or<T: FromStr>(map: &HashMap<String, String>, key: &str, default: T) -> T {
    map.get(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn get_flag(map: &HashMap<String, String>, key: &str, default: bool) -> bool {
    match map.get(key).map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

fn get_opt(map: &HashMap<String, String>, key: &str) -> Option<String> {
    map.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

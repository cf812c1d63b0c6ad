//! Configuration resolution for edugen-ai
//!
//! API keys resolve ENV → TOML. A key found in several places is a likely
//! misconfiguration and is logged, but the higher-priority source wins.
//! Missing keys are not startup errors: callers may still supply their own
//! per-call key, and a call without any key fails with `ConfigurationError`.

use crate::credential::Credential;
use crate::model::GeminiConfig;
use edugen_common::config::TomlConfig;
use std::time::Duration;
use tracing::{info, warn};

pub const GEMINI_KEY_ENV_VAR: &str = "GEMINI_API_KEY";
pub const YOUTUBE_KEY_ENV_VAR: &str = "YOUTUBE_API_KEY";

/// Resolve the default model key (ENV → TOML)
pub fn resolve_gemini_api_key(toml_config: &TomlConfig) -> Option<String> {
    resolve_key(
        "Gemini",
        std::env::var(GEMINI_KEY_ENV_VAR).ok(),
        toml_config.gemini_api_key.as_deref(),
    )
}

/// Resolve the video search key (ENV → TOML)
pub fn resolve_youtube_api_key(toml_config: &TomlConfig) -> Option<String> {
    resolve_key(
        "YouTube",
        std::env::var(YOUTUBE_KEY_ENV_VAR).ok(),
        toml_config.youtube_api_key.as_deref(),
    )
}

fn resolve_key(label: &str, env_key: Option<String>, toml_key: Option<&str>) -> Option<String> {
    let env_key = env_key.filter(|k| is_valid_key(k));
    let toml_key = toml_key.filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "{} API key found in multiple sources: environment, TOML. Using environment (highest priority).",
            label
        );
    }

    if let Some(key) = env_key {
        info!("{} API key loaded from environment variable", label);
        return Some(key.trim().to_string());
    }

    if let Some(key) = toml_key {
        info!("{} API key loaded from TOML config", label);
        return Some(key.trim().to_string());
    }

    warn!("{} API key not configured; calls must supply their own", label);
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Fully resolved, immutable service settings
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub bind_address: String,
    pub port: u16,
    pub gemini: GeminiConfig,
    pub search_base_url: String,
    pub gemini_api_key: Option<Credential>,
    pub youtube_api_key: Option<String>,
    pub request_timeout: Duration,
    pub operation_budget: Duration,
    pub poll_interval: Duration,
}

impl ServiceSettings {
    /// Build settings from a loaded TOML file plus the environment
    pub fn resolve(toml_config: &TomlConfig) -> Self {
        Self::from_parts(
            toml_config,
            resolve_gemini_api_key(toml_config),
            resolve_youtube_api_key(toml_config),
        )
    }

    fn from_parts(
        toml_config: &TomlConfig,
        gemini_api_key: Option<String>,
        youtube_api_key: Option<String>,
    ) -> Self {
        let models = &toml_config.models;
        let timeouts = &toml_config.timeouts;
        let request_timeout = Duration::from_secs(timeouts.request_secs.max(1));

        Self {
            bind_address: toml_config.server.bind_address.clone(),
            port: toml_config.server.port,
            gemini: GeminiConfig {
                base_url: models.api_base_url.clone(),
                text_model: models.text_model.clone(),
                speech_model: models.speech_model.clone(),
                video_model: models.video_model.clone(),
                voice: models.voice.clone(),
                http_timeout: request_timeout,
            },
            search_base_url: models.search_base_url.clone(),
            gemini_api_key: gemini_api_key.map(Credential::new),
            youtube_api_key,
            request_timeout,
            operation_budget: Duration::from_secs(timeouts.operation_secs.max(1)),
            // A zero interval would turn polling into a busy loop
            poll_interval: Duration::from_secs(timeouts.poll_interval_secs.max(1)),
        }
    }
}

//! Configuration file loading and path resolution
//!
//! Config file location follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. `EDUGEN_CONFIG` environment variable
//! 3. OS-dependent default (`~/.config/edugen/<module>.toml` on Linux)
//!
//! A missing file is not an error: every section has compiled defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "EDUGEN_CONFIG";

/// Contents of a service TOML config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub models: ModelConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    /// Default generative model key, used when a call supplies none
    pub gemini_api_key: Option<String>,
    /// Video search key used by the enrichment task
    pub youtube_api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 5730,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Hosted model endpoints and model names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub api_base_url: String,
    pub search_base_url: String,
    pub text_model: String,
    pub speech_model: String,
    pub video_model: String,
    /// Prebuilt voice used for speech synthesis
    pub voice: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://generativelanguage.googleapis.com".to_string(),
            search_base_url: "https://www.googleapis.com".to_string(),
            text_model: "gemini-2.0-flash".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            video_model: "veo-2.0-generate-001".to_string(),
            voice: "Algenib".to_string(),
        }
    }
}

/// Time budgets, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for a request that did not supply its own
    pub request_secs: u64,
    /// Upper bound for one long-running media operation
    pub operation_secs: u64,
    /// Wait between operation status checks
    pub poll_interval_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 120,
            operation_secs: 600,
            poll_interval_secs: 5,
        }
    }
}

/// OS-dependent default config file for a service module
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("edugen").join(format!("{}.toml", module_name)))
}

/// Resolve which config file a service should read
///
/// Returns `None` only when no CLI/ENV path is given and the platform has no
/// config directory.
pub fn resolve_config_path(cli_arg: Option<&Path>, module_name: &str) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path(module_name)
}

/// Load a config file, falling back to defaults when it does not exist
///
/// # Errors
///
/// `Error::Config` if the file exists but cannot be read or parsed.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            path = %path.display(),
            "Config file not found, using compiled defaults"
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = parse_toml_config(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

    info!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Parse config file contents
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

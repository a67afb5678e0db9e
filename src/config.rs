//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. explicit path (e.g. the CLI's `--config <path>`)
//! 2. `~/.tolk/config.toml` (user)
//! 3. `/etc/tolk/config.toml` (system)
//!
//! When no file is found in the standard locations, defaults are used. Every
//! field has a default, so a config file only needs the settings it changes.
//!
//! The HuggingFace API key is never read from the config file; it comes from
//! the `HF_API_KEY` environment variable.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::CatalogConfig;
use crate::model::{DEFAULT_MODEL_CAPACITY, EvictionPolicy, RetryConfig};
use crate::worker::{DEFAULT_CHUNK_THRESHOLD_FACTOR, DEFAULT_ERROR_MESSAGE_CHARS, DEFAULT_MAX_LENGTH};
use crate::{Result, TolkError};

/// Environment variable holding the HuggingFace API key.
pub const HF_API_KEY_ENV: &str = "HF_API_KEY";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub retry: RetrySettings,
    /// Replaces the embedded catalog when present.
    #[serde(default)]
    pub catalog: Option<CatalogConfig>,
    #[serde(default)]
    pub backend: BackendConfig,
}

/// Task system tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Models kept loaded at once (default: 1).
    #[serde(default = "default_model_capacity")]
    pub model_capacity: usize,
    /// "flush_all" (default) or "lru".
    #[serde(default)]
    pub eviction: EvictionPolicy,
    /// Max sequence length for models that don't report one (default: 512).
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// Chunk inputs longer than this multiple of max_length (default: 2).
    #[serde(default = "default_chunk_threshold_factor")]
    pub chunk_threshold_factor: usize,
    /// Characters per chunk (default: max_length).
    #[serde(default)]
    pub chunk_chars: Option<usize>,
    /// Cap on stored error text (default: 200).
    #[serde(default = "default_error_message_chars")]
    pub error_message_chars: usize,
    /// Task expiry in seconds; unset means tasks never expire.
    #[serde(default)]
    pub task_ttl_secs: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_capacity: default_model_capacity(),
            eviction: EvictionPolicy::default(),
            max_length: default_max_length(),
            chunk_threshold_factor: default_chunk_threshold_factor(),
            chunk_chars: None,
            error_message_chars: default_error_message_chars(),
            task_ttl_secs: None,
        }
    }
}

fn default_model_capacity() -> usize {
    DEFAULT_MODEL_CAPACITY
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

fn default_chunk_threshold_factor() -> usize {
    DEFAULT_CHUNK_THRESHOLD_FACTOR
}

fn default_error_message_chars() -> usize {
    DEFAULT_ERROR_MESSAGE_CHARS
}

/// Model load retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Attempts including the first (default: 3).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base backoff in milliseconds (default: 500).
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Backoff cap in milliseconds (default: 30000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetrySettings {
    /// Convert to the runtime retry policy.
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig::new()
            .max_attempts(self.max_attempts)
            .initial_delay(Duration::from_millis(self.initial_delay_ms))
            .max_delay(Duration::from_millis(self.max_delay_ms))
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

/// Translation backend settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub huggingface: HuggingFaceConfig,
}

/// HuggingFace Inference API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuggingFaceConfig {
    /// API base URL (default: https://api-inference.huggingface.co).
    #[serde(default = "default_hf_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 120; cold models are slow).
    #[serde(default = "default_hf_timeout")]
    pub timeout_secs: u64,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            base_url: default_hf_base_url(),
            timeout_secs: default_hf_timeout(),
        }
    }
}

fn default_hf_base_url() -> String {
    "https://api-inference.huggingface.co".to_string()
}

fn default_hf_timeout() -> u64 {
    120
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided; must exist)
    /// 2. `~/.tolk/config.toml`
    /// 3. `/etc/tolk/config.toml`
    ///
    /// Falls back to [`Config::default`] when neither standard file exists.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse a specific config file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            TolkError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            TolkError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path, if any.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(TolkError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".tolk").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/tolk/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// HuggingFace API key from the environment, if set.
    pub fn hf_api_key() -> Option<String> {
        std::env::var(HF_API_KEY_ENV).ok().filter(|k| !k.is_empty())
    }
}

//! TOML configuration parsing and validation.
//!
//! Every section is optional; a missing file at the default path means
//! "use defaults". See `config/docchat.example.toml` for all keys.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use docchat_core::chunk::DEFAULT_MAX_CHUNK_CHARS;
use docchat_core::search::DEFAULT_LIMIT;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Listen address for `docchat serve`.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7331".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
        }
    }
}

fn default_max_chunk_chars() -> usize {
    DEFAULT_MAX_CHUNK_CHARS
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Chunks retrieved as context per question.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    /// Reported by `status`; not enforced.
    #[serde(default = "default_storage_limit_bytes")]
    pub storage_limit_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            storage_limit_bytes: default_storage_limit_bytes(),
        }
    }
}

fn default_max_file_bytes() -> u64 {
    50 * 1024 * 1024
}
fn default_storage_limit_bytes() -> u64 {
    500 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Prior conversation messages sent along with each question.
    #[serde(default = "default_history_messages")]
    pub history_messages: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            history_messages: default_history_messages(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_model() -> String {
    "gpt-4o".to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_history_messages() -> usize {
    5
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    2
}

impl GenerationConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

/// Read and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to defaults.
///
/// Used for the default config location only; an explicitly requested
/// file must exist.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

pub fn validate(config: &Config) -> Result<()> {
    if config.chunking.max_chunk_chars == 0 {
        bail!("chunking.max_chunk_chars must be > 0");
    }

    if config.retrieval.limit < 1 {
        bail!("retrieval.limit must be >= 1");
    }

    if config.upload.max_file_bytes == 0 {
        bail!("upload.max_file_bytes must be > 0");
    }

    if !(0.0..=2.0).contains(&config.generation.temperature) {
        bail!("generation.temperature must be in [0.0, 2.0]");
    }

    if config.server.bind.trim().is_empty() {
        bail!("server.bind must not be empty");
    }

    match config.generation.provider.as_str() {
        "disabled" | "openai" => {}
        other => bail!(
            "Unknown generation provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    Ok(())
}

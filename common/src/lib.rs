/*!
common/src/lib.rs

Shared configuration types for Newsdesk.

This file provides:
- Config data structures (deserialized from TOML, every field defaulted)
- An async loader merging a default file with an optional override file
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Model provider configuration (OpenAI-compatible chat completions endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Full chat completions URL
    pub api_url: String,
    /// Name of the env var holding the provider API key
    pub api_key_env: String,
    /// Model id used for the primary tier
    pub primary: String,
    /// Model id used when the primary tier cannot be constructed
    pub fallback: String,
    pub timeout_seconds: u64,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
                .to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            primary: "gemini-1.5-pro".to_string(),
            fallback: "gemini-1.5-flash".to_string(),
            timeout_seconds: 60,
            max_tokens: Some(4096),
            temperature: Some(0.7),
        }
    }
}

/// Search / content extraction tool configuration (Firecrawl v1 API)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// API root, e.g. "https://api.firecrawl.dev/v1"
    pub api_url: String,
    /// Name of the env var holding the search tool API key
    pub api_key_env: String,
    pub timeout_seconds: u64,
    /// Max characters of page markdown handed back to the model per document
    pub max_content_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.firecrawl.dev/v1".to_string(),
            api_key_env: "FIRECRAWL_API_KEY".to_string(),
            timeout_seconds: 60,
            max_content_chars: 4000,
        }
    }
}

/// Newsletter generation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub default_limit: u32,
    /// Recency code used when the caller gives none (e.g. "qdr:w")
    pub default_recency: String,
    /// Upper bound for one whole agent run, searches included
    pub timeout_seconds: u64,
    /// Max model turns before the agent run is abandoned
    pub max_tool_iterations: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            default_recency: "qdr:w".to_string(),
            timeout_seconds: 300,
            max_tool_iterations: 8,
        }
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub search: SearchConfig,
    pub generation: GenerationConfig,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence). Missing
    /// files are skipped and anything left unset falls back to built-in defaults.
    pub async fn load_with_defaults(
        default_path: Option<&Path>,
        override_path: Option<&Path>,
    ) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        if let Some(path) = default_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await.with_context(|| {
                    format!("Failed to read default config: {}", path.display())
                })?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse default configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        if let Some(path) = override_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await.with_context(|| {
                    format!("Failed to read override config: {}", path.display())
                })?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse override configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

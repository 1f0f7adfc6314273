//! JSON configuration: defaults, validation, and the mutable setting surface.
//!
//! The configuration lives at `<storage root>/config.json` and is created
//! with defaults on first run. Every mutation goes through [`Config::set`],
//! which validates before anything is persisted, so an invalid combination
//! (for example `chunk_overlap >= chunk_size`) never reaches disk.
//!
//! Model and temperature changes only take effect on the next completion
//! binding; chunk parameters only affect subsequent ingestion — documents
//! already in the store are not re-chunked retroactively.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::chunk::ChunkParams;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Groq API key. `GROQ_API_KEY` in the environment takes precedence.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum chunk length in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Shared span between consecutive chunks, in bytes. Must stay below
    /// `chunk_size`.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_chunk_size() -> usize {
    500
}
fn default_chunk_overlap() -> usize {
    50
}
fn default_top_k() -> usize {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// OpenAI-compatible endpoint root (local servers work too).
    #[serde(default = "default_embed_base_url")]
    pub base_url: String,
    #[serde(default = "default_embed_model")]
    pub model: String,
    /// Key for the embedding endpoint; `OPENAI_API_KEY` takes precedence.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embed_base_url(),
            model: default_embed_model(),
            api_key: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embed_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_embed_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load the configuration file, creating it with defaults when missing.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.chunk_params().validate()?;
        if !(0.0..=1.0).contains(&self.temperature) {
            bail!("temperature must be in [0.0, 1.0]");
        }
        if self.top_k == 0 {
            bail!("top_k must be >= 1");
        }
        if self.embedding.batch_size == 0 {
            bail!("embedding.batch_size must be >= 1");
        }
        Ok(())
    }

    pub fn chunk_params(&self) -> ChunkParams {
        ChunkParams {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
        }
    }

    /// Apply one `key = value` change, validating the resulting config.
    ///
    /// On error the config is left unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();

        match key {
            "api_key" => updated.api_key = value.to_string(),
            "model" => updated.model = value.to_string(),
            "temperature" => {
                updated.temperature = value
                    .parse()
                    .with_context(|| format!("temperature must be a number, got '{}'", value))?
            }
            "chunk_size" => {
                updated.chunk_size = value
                    .parse()
                    .with_context(|| format!("chunk_size must be an integer, got '{}'", value))?
            }
            "chunk_overlap" => {
                updated.chunk_overlap = value
                    .parse()
                    .with_context(|| format!("chunk_overlap must be an integer, got '{}'", value))?
            }
            "top_k" => {
                updated.top_k = value
                    .parse()
                    .with_context(|| format!("top_k must be an integer, got '{}'", value))?
            }
            "embedding.base_url" => updated.embedding.base_url = value.to_string(),
            "embedding.model" => updated.embedding.model = value.to_string(),
            other => bail!(
                "Unknown config key: '{}'. Known keys: api_key, model, temperature, \
                 chunk_size, chunk_overlap, top_k, embedding.base_url, embedding.model",
                other
            ),
        }

        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.model, "llama-3.3-70b-versatile");
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.top_k, 3);
    }

    #[test]
    fn test_overlap_must_stay_below_size() {
        let mut config = Config::default();
        assert!(config.set("chunk_overlap", "500").is_err());
        // Failed set leaves the config untouched.
        assert_eq!(config.chunk_overlap, 50);
    }

    #[test]
    fn test_set_parses_and_validates() {
        let mut config = Config::default();
        config.set("temperature", "0.7").unwrap();
        assert!((config.temperature - 0.7).abs() < 1e-6);

        assert!(config.set("temperature", "1.5").is_err());
        assert!(config.set("temperature", "warm").is_err());
        assert!(config.set("top_k", "0").is_err());
        assert!(config.set("nonsense", "x").is_err());
    }

    #[test]
    fn test_load_or_init_writes_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");

        let first = Config::load_or_init(&path).unwrap();
        assert!(path.exists());

        let second = Config::load_or_init(&path).unwrap();
        assert_eq!(second.model, first.model);
        assert_eq!(second.chunk_size, first.chunk_size);
    }

    #[test]
    fn test_partial_file_gets_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"model": "mixtral-8x7b-32768"}"#).unwrap();

        let config = Config::load_or_init(&path).unwrap();
        assert_eq!(config.model, "mixtral-8x7b-32768");
        assert_eq!(config.top_k, 3);
    }
}

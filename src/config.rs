//! Configuration loader and validator for the outlier search tool.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::search::DiscoverOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub app: App,
    pub youtube: YouTube,
    #[serde(default)]
    pub search: Search,
    #[serde(default)]
    pub vision: Option<Vision>,
    #[serde(default)]
    pub openai: Option<OpenAi>,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
}

/// YouTube Data API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct YouTube {
    pub api_key: String,
    #[serde(default = "default_youtube_base_url")]
    pub base_url: String,
}

/// Result caps and batching limits for discovery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Search {
    #[serde(default = "default_per_channel_max_results")]
    pub per_channel_max_results: u32,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_channel_concurrency")]
    pub channel_concurrency: usize,
}

/// Thumbnail description service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vision {
    pub endpoint: String,
    pub client_id: String,
}

/// Text completion service used to narrate thumbnail descriptions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenAi {
    pub api_key: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

/// The provider refuses detail lookups for more ids than this.
pub const MAX_BATCH_SIZE: usize = 50;

fn default_youtube_base_url() -> String {
    "https://www.googleapis.com/youtube/v3/".to_string()
}

fn default_per_channel_max_results() -> u32 {
    10
}

fn default_max_results() -> u32 {
    20
}

fn default_batch_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_channel_concurrency() -> usize {
    4
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo-instruct".to_string()
}

fn default_max_tokens() -> u32 {
    50
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for Search {
    fn default() -> Self {
        Self {
            per_channel_max_results: default_per_channel_max_results(),
            max_results: default_max_results(),
            batch_size: default_batch_size(),
            channel_concurrency: default_channel_concurrency(),
        }
    }
}

impl Search {
    pub fn discover_options(&self) -> DiscoverOptions {
        DiscoverOptions {
            per_channel_max_results: self.per_channel_max_results,
            max_results: self.max_results,
            batch_size: self.batch_size,
            channel_concurrency: self.channel_concurrency,
        }
    }
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.data_dir)
    }

    /// SQLite URL for the cache, overridable with `DATABASE_URL`.
    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            format!("sqlite://{}/cache.db", self.app.data_dir.trim_end_matches('/'))
        })
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }

    if cfg.youtube.api_key.trim().is_empty() {
        return Err(ConfigError::Invalid("youtube.api_key must be non-empty"));
    }
    if reqwest::Url::parse(&cfg.youtube.base_url).is_err() {
        return Err(ConfigError::Invalid("youtube.base_url must be a valid URL"));
    }

    let s = &cfg.search;
    if s.per_channel_max_results == 0 {
        return Err(ConfigError::Invalid("search.per_channel_max_results must be > 0"));
    }
    if s.max_results == 0 {
        return Err(ConfigError::Invalid("search.max_results must be > 0"));
    }
    if s.batch_size == 0 || s.batch_size > MAX_BATCH_SIZE {
        return Err(ConfigError::Invalid("search.batch_size must be within 1..=50"));
    }
    if s.channel_concurrency == 0 {
        return Err(ConfigError::Invalid("search.channel_concurrency must be > 0"));
    }

    if let Some(vision) = &cfg.vision {
        if vision.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("vision.endpoint must be non-empty"));
        }
        if vision.client_id.trim().is_empty() {
            return Err(ConfigError::Invalid("vision.client_id must be non-empty"));
        }
    }

    if let Some(openai) = &cfg.openai {
        if openai.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("openai.api_key must be non-empty"));
        }
        if openai.model.trim().is_empty() {
            return Err(ConfigError::Invalid("openai.model must be non-empty"));
        }
    }

    Ok(())
}

/// Returns a complete example configuration.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"

youtube:
  api_key: "YOUR_YOUTUBE_API_KEY"

search:
  per_channel_max_results: 10
  max_results: 20
  batch_size: 50
  channel_concurrency: 4

vision:
  endpoint: "https://api.visionai.example.com/analyze"
  client_id: "YOUR_VISION_CLIENT_ID"

openai:
  api_key: "YOUR_OPENAI_API_KEY"
  model: "gpt-3.5-turbo-instruct"
  max_tokens: 50
  temperature: 0.7
"#
}

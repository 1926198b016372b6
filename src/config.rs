//! Configuration loading and management for precis.
//!
//! Loads settings from `precis.toml` with environment variable overrides for sensitive data.
//! Every field has a default, so a missing file simply means a default configuration.

use crate::fetch::DEFAULT_USER_AGENT;
use crate::scraper::DEFAULT_CONTENT_SELECTORS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE: &str = "precis.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("missing required API key for provider: {0}")]
    MissingApiKey(String),
    #[error("unknown LLM provider: {0}")]
    UnknownProvider(String),
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// LLM provider: "gemini" or "openai"
    pub provider: String,
    /// Model identifier (e.g., "gemini-2.0-flash")
    pub model: String,
    /// Upper bound on generated tokens
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    /// Override for the provider endpoint, mostly for proxies and tests
    pub base_url: Option<String>,
    /// Optional system persona prepended to every prompt
    pub persona: Option<String>,
}

/// Page fetching and extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Cap on extracted body text, in characters
    pub max_chars: usize,
    /// Cap on the preview shown next to a summary, in characters
    pub preview_chars: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Main content selectors, highest priority first
    pub content_selectors: Vec<String>,
    /// Look the title up with a second request instead of reusing the fetched page
    pub refetch_title: bool,
}

/// API keys configuration (loaded from environment)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub gemini_key: Option<String>,
    #[serde(default)]
    pub openai_key: Option<String>,
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Load configuration from the default location (precis.toml in cwd or home)
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                let mut config = Config::default();
                config.apply_env();
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Override API keys from environment variables
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.api.gemini_key = Some(key);
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.api.openai_key = Some(key);
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let local_config = PathBuf::from(CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::home_dir()
            .map(|home| home.join(".config").join("precis").join(CONFIG_FILE))
            .filter(|path| path.exists())
    }

    /// Get the API key for the configured provider
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        match self.agent.provider.as_str() {
            "gemini" => self
                .api
                .gemini_key
                .as_deref()
                .ok_or_else(|| ConfigError::MissingApiKey("gemini".to_string())),
            "openai" => self
                .api
                .openai_key
                .as_deref()
                .ok_or_else(|| ConfigError::MissingApiKey("openai".to_string())),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash".to_string(),
            max_output_tokens: 1000,
            temperature: 0.3,
            top_p: 0.9,
            base_url: None,
            persona: None,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_chars: 15_000,
            preview_chars: 500,
            timeout_secs: 15,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            content_selectors: DEFAULT_CONTENT_SELECTORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            refetch_title: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_limits() {
        let config = Config::default();
        assert_eq!(config.extraction.max_chars, 15_000);
        assert_eq!(config.extraction.preview_chars, 500);
        assert_eq!(config.extraction.timeout_secs, 15);
        assert_eq!(config.agent.max_output_tokens, 1000);
        assert!((config.agent.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.extraction.content_selectors[0], "article");
        assert!(!config.extraction.refetch_title);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r##"
[agent]
provider = "openai"
model = "gpt-4o-mini"

[extraction]
max_chars = 2000
content_selectors = ["#story", "article"]
"##
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.agent.provider, "openai");
        assert_eq!(config.agent.model, "gpt-4o-mini");
        assert_eq!(config.agent.max_output_tokens, 1000);
        assert_eq!(config.extraction.max_chars, 2000);
        assert_eq!(config.extraction.preview_chars, 500);
        assert_eq!(config.extraction.content_selectors, vec!["#story", "article"]);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[agent\nprovider = ").unwrap();

        assert!(matches!(
            Config::load_from(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn api_key_is_looked_up_per_provider() {
        let mut config = Config::default();
        config.api.gemini_key = Some("g-key".to_string());
        assert_eq!(config.api_key().unwrap(), "g-key");

        config.agent.provider = "openai".to_string();
        assert!(matches!(
            config.api_key(),
            Err(ConfigError::MissingApiKey(p)) if p == "openai"
        ));

        config.agent.provider = "mystery".to_string();
        assert!(matches!(
            config.api_key(),
            Err(ConfigError::UnknownProvider(_))
        ));
    }
}

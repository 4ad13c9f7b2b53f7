//! Configuration file support

use serde::{Deserialize, Serialize};
use sous_ai::Provider;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for sous
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default model to use
    pub model: Option<String>,
    /// Default provider
    pub provider: Option<String>,
    /// Recipe backend; saving is unavailable without it
    pub backend_url: Option<String>,
    /// Where trend search records are written
    pub trend_log_dir: Option<PathBuf>,
    /// Candidate concepts offered to the forecast selector
    pub forecast_items: Vec<String>,
    /// Deadline for one model completion
    pub llm_timeout_secs: Option<u64>,
    /// Deadline for one web search
    pub search_timeout_secs: Option<u64>,
    /// API keys (alternative to environment variables)
    pub api_keys: ApiKeys,
}

/// API key configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
    pub serpapi: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sous")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("SOUS_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from the default location
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, falling back to defaults on any problem
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to parse config file");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read config file");
                Self::default()
            }
        }
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            model: Some(sous_ai::models::DEFAULT_MODEL_ID.to_string()),
            provider: Some("openai".to_string()),
            llm_timeout_secs: Some(60),
            search_timeout_secs: Some(15),
            ..Default::default()
        };

        default_config.save_to(&path)?;
        Ok(path)
    }

    /// Get the API key for an LLM provider, checking config then env
    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        let from_config = match provider {
            "anthropic" => self.api_keys.anthropic.clone(),
            "openai" => self.api_keys.openai.clone(),
            _ => None,
        };
        if from_config.is_some() {
            return from_config;
        }

        let env_var = Provider::parse(provider).api_key_env_var()?;
        std::env::var(env_var).ok()
    }

    /// Get the web search key, checking config then env
    pub fn serpapi_key(&self) -> Option<String> {
        self.api_keys
            .serpapi
            .clone()
            .or_else(|| std::env::var("SERPAPI_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }

    /// Trend log directory, defaulting under the local data dir
    pub fn trend_log_dir(&self) -> PathBuf {
        self.trend_log_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("sous")
                .join("logs")
        })
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# sous configuration file
# Place at ~/.config/sous/config.toml (Linux/Mac) or %APPDATA%\sous\config.toml (Windows)

# Default model to use
model = "gpt-4.1-mini"

# Default provider (openai, anthropic, groq, openrouter, ollama)
provider = "openai"

# Recipe backend for saving (optional)
# backend_url = "http://localhost:8080"

# Trend search records (optional)
# trend_log_dir = "~/.local/share/sous/logs"

# Candidate concepts for the forecast selector
# forecast_items = ["흑임자", "유자", "말차"]

llm_timeout_secs = 60
search_timeout_secs = 15

# API keys (optional - can also use environment variables)
[api_keys]
# openai = "sk-..."
# anthropic = "sk-ant-..."
# serpapi = "..."
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load_from(&tmp.path().join("nope.toml"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_partial_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
provider = "anthropic"
forecast_items = ["유자", "말차"]

[api_keys]
serpapi = "serp-key"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.provider.as_deref(), Some("anthropic"));
        assert_eq!(config.forecast_items, vec!["유자".to_string(), "말차".into()]);
        assert_eq!(config.serpapi_key().as_deref(), Some("serp-key"));
        assert_eq!(config.model, None);
    }

    #[test]
    fn test_broken_file_is_default() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "model = [unterminated").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.toml");
        let config = Config {
            model: Some("gpt-4.1".into()),
            backend_url: Some("http://localhost:8080".into()),
            llm_timeout_secs: Some(30),
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn test_config_key_wins() {
        let config = Config {
            api_keys: ApiKeys {
                openai: Some("from-config".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config.get_api_key("openai").as_deref(), Some("from-config"));
    }

    #[test]
    fn test_example_config_parses() {
        let config: Config = toml::from_str(example_config()).unwrap();
        assert_eq!(config.model.as_deref(), Some("gpt-4.1-mini"));
        assert_eq!(config.search_timeout_secs, Some(15));
    }
}

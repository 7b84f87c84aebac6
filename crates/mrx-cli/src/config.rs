//! Configuration file support

use mrx_ai::Provider;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration for mrx
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default model to use
    pub model: Option<String>,
    /// Default provider (openai, groq, openrouter, ollama, custom)
    pub provider: Option<String>,
    /// Override the provider's API base URL
    pub base_url: Option<String>,
    /// Rephrase agent messages through the LLM
    pub polish: Option<bool>,
    /// Company every study is run for, regardless of the objective
    pub client_company: Option<String>,
    /// Seconds allowed for one LLM call
    pub timeout_secs: Option<u64>,
    /// Brief generation attempts before giving up
    pub max_brief_attempts: Option<u32>,
    /// Retries for transient provider failures (rate limits, 5xx, dropped connections)
    pub transport_retries: Option<u32>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// API keys (alternative to environment variables)
    #[serde(default)]
    pub api_keys: ApiKeys,
}

/// API key configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub openai: Option<String>,
    pub groq: Option<String>,
    pub openrouter: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mrx")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("MRX_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Parse config file content
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match Self::from_toml(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
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
            model: Some("gpt-4o-mini".to_string()),
            provider: Some("openai".to_string()),
            polish: Some(true),
            timeout_secs: Some(60),
            max_brief_attempts: Some(5),
            transport_retries: Some(0),
            ..Default::default()
        };

        default_config.save()?;
        Ok(path)
    }

    /// Get API key for a provider, checking config then env
    pub fn get_api_key(&self, provider: Provider) -> Option<String> {
        let from_config = match provider {
            Provider::OpenAI => self.api_keys.openai.clone(),
            Provider::Groq => self.api_keys.groq.clone(),
            Provider::OpenRouter => self.api_keys.openrouter.clone(),
            Provider::Ollama | Provider::Custom => None,
        };

        if from_config.is_some() {
            return from_config;
        }

        provider
            .api_key_env_var()
            .and_then(|var| std::env::var(var).ok())
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# mrx configuration file
# Place at ~/.config/mrx/config.toml (Linux/Mac) or %APPDATA%\mrx\config.toml (Windows)

# Default model to use
model = "gpt-4o-mini"

# Default provider (openai, groq, openrouter, ollama, custom)
provider = "openai"

# API base URL (required for the custom provider)
# base_url = "http://localhost:8000/v1"

# Rephrase agent messages through the LLM (true by default)
polish = true

# Run every study for this company instead of the one named in the objective
# client_company = "Acme Co"

# Seconds allowed for one LLM call
timeout_secs = 60

# Brief generation attempts before giving up
max_brief_attempts = 5

# Retries for rate limits, server errors and dropped connections
transport_retries = 0

# temperature = 0.0
# max_tokens = 4096

# API keys (optional - can also use environment variables or a .env file)
[api_keys]
# openai = "sk-..."
# groq = "gsk_..."
# openrouter = "sk-or-..."
"#
}

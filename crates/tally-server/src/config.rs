//! Configuration file parsing for the server.
//!
//! Loads the database path, model endpoint, extraction limits and HTTP
//! settings from a TOML file with `[app]`, `[openai]`, `[extractor]` and
//! `[http]` sections.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tally_extractor::ExtractorConfig;
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// A field has an unusable value
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// Dotted field name
        field: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Application settings
    #[serde(default)]
    pub app: AppConfig,

    /// Model endpoint settings
    pub openai: OpenAiConfig,

    /// Extraction limits; `timeout_secs` here bounds the whole model call
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// HTTP listener settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// `[app]` section
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Verbose logging when no `RUST_LOG` is set
    #[serde(default)]
    pub debug: bool,

    /// SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

/// `[openai]` section
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    /// API key; `OPENAI_API_KEY` is used when empty
    #[serde(default)]
    pub token: String,

    /// OpenAI-compatible base URL; the public API when absent
    #[serde(default)]
    pub base_url: Option<String>,

    /// Model name (e.g., "gpt-4o-mini")
    #[serde(default)]
    pub model: String,

    /// Model call timeout in seconds (default: 10)
    #[serde(default = "default_openai_timeout")]
    pub timeout_secs: u64,

    /// Extra attempts after a transient failure (default: 0)
    #[serde(default)]
    pub max_retries: u32,
}

/// `[http]` section
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Listen address (e.g., "127.0.0.1:3333")
    #[serde(default = "default_address")]
    pub address: String,

    /// Whole-request timeout in seconds (default: 30)
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

fn default_db_path() -> String {
    "tally.db".to_string()
}

fn default_openai_timeout() -> u64 {
    10
}

fn default_address() -> String {
    "127.0.0.1:3333".to_string()
}

fn default_http_timeout() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            debug: false,
            db_path: default_db_path(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            timeout_secs: default_http_timeout(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file, falling back to `OPENAI_API_KEY`
    /// for an empty token, and validate it
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?.with_env_token(std::env::var("OPENAI_API_KEY").ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string without validating it
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Use `token` when the file left the API key empty
    pub fn with_env_token(mut self, token: Option<String>) -> Self {
        if self.openai.token.trim().is_empty() {
            if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
                self.openai.token = token;
            }
        }
        self
    }

    /// Check required fields and timeouts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.openai.token.trim().is_empty() {
            return Err(ConfigError::MissingField("openai.token".to_string()));
        }
        if self.openai.model.trim().is_empty() {
            return Err(ConfigError::MissingField("openai.model".to_string()));
        }
        if self.openai.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "openai.timeout_secs".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http.timeout_secs".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.app.db_path.trim().is_empty() {
            return Err(ConfigError::MissingField("app.db_path".to_string()));
        }
        self.extractor
            .validate()
            .map_err(|reason| ConfigError::InvalidValue {
                field: "extractor".to_string(),
                reason,
            })?;
        Ok(())
    }

    /// Model call timeout
    pub fn openai_timeout(&self) -> Duration {
        Duration::from_secs(self.openai.timeout_secs)
    }

    /// Whole-request timeout
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// Default log filter when `RUST_LOG` is not set
    pub fn log_level(&self) -> &'static str {
        if self.app.debug {
            "debug"
        } else {
            "info"
        }
    }

    /// A configuration for tests, with an in-memory database
    pub fn default_test_config() -> Self {
        ServerConfig {
            app: AppConfig {
                debug: true,
                db_path: ":memory:".to_string(),
            },
            openai: OpenAiConfig {
                token: "test-token".to_string(),
                base_url: None,
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 10,
                max_retries: 0,
            },
            extractor: ExtractorConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

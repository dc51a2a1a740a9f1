//! Configuration for the Extractor
//!
//! Deserialized from the server's `[extractor]` section; every field has a
//! default.

use crate::schema::TOOL_NAME;
use serde::Deserialize;
use std::time::Duration;

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum time for one model call (seconds)
    pub timeout_secs: u64,

    /// Maximum input text length (characters)
    pub max_text_length: usize,

    /// Name of the tool the model is asked to call
    pub tool_name: String,
}

impl ExtractorConfig {
    /// Get the model call timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.tool_name.trim().is_empty() {
            return Err("tool_name must not be empty".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_text_length: 4_000,
            tool_name: TOOL_NAME.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.tool_name, "parse_financial_data");
    }

    #[test]
    fn test_invalid_timeout() {
        let config = ExtractorConfig {
            timeout_secs: 0,
            ..ExtractorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_tool_name() {
        let config = ExtractorConfig {
            tool_name: "  ".to_string(),
            ..ExtractorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ExtractorConfig = toml::from_str("max_text_length = 20000").unwrap();
        assert_eq!(config.max_text_length, 20_000);
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.tool_name, TOOL_NAME);
    }

    #[test]
    fn test_bad_toml_is_rejected() {
        assert!(toml::from_str::<ExtractorConfig>("timeout_secs = \"soon\"").is_err());
    }
}

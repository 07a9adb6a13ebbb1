//! Gateway settings and credential resolution.
//!
//! The credential is never stored in configuration files; it is read from the
//! process environment at invocation time. A missing key is a configuration
//! error raised before any network call is attempted.

use crate::errors::OrchestratorError;
use crate::llm::gateway::{DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};

/// Default environment variable holding the completion gateway credential.
pub const DEFAULT_API_KEY_ENV: &str = "FALCON_GATEWAY_API_KEY";

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Explicit key, used as-is when present. Takes precedence over the env var.
    pub api_key: Option<String>,
    /// Environment variable to read the key from.
    pub api_key_env: String,
    pub api_base: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GatewaySettings {
    pub fn resolve_api_key(&self) -> Result<String, OrchestratorError> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                OrchestratorError::ConfigError(format!(
                    "No gateway API key found. Set {} or provide api_key",
                    self.api_key_env
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_key_takes_precedence() {
        let settings = GatewaySettings {
            api_key: Some("explicit".to_string()),
            api_key_env: "FALCON_TEST_UNSET_VAR".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.resolve_api_key().unwrap(), "explicit");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let settings = GatewaySettings {
            api_key: None,
            api_key_env: "FALCON_TEST_DEFINITELY_UNSET".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            settings.resolve_api_key(),
            Err(OrchestratorError::ConfigError(_))
        ));
    }
}

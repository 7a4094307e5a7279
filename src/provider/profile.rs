//! Provider profile: the `[provider]` section of the configuration and credential resolution.

use crate::error::ApiError;
use crate::provider::ModelProvider;
use serde::{Deserialize, Serialize};

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
/// Environment variable holding the credential unless configured otherwise.
pub const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Anthropic,
    OpenAI,
}

impl ProviderType {
    /// Highest sampling temperature the provider's API accepts.
    pub fn max_temperature(self) -> f32 {
        match self {
            ProviderType::Anthropic => 1.0,
            ProviderType::OpenAI => 2.0,
        }
    }
}

impl Default for ProviderType {
    fn default() -> Self {
        ProviderType::Anthropic
    }
}

/// Provider configuration as written in config files.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub provider_type: ProviderType,

    #[serde(default = "default_model")]
    pub model: String,

    /// Inline credential; the environment variable is used when absent
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL override (proxies, OpenAI-compatible servers)
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::default(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            endpoint: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider_type", &self.provider_type)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_env", &self.api_key_env)
            .field("endpoint", &self.endpoint)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model cannot be empty".to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!(
                    "Endpoint must start with http:// or https://: {}",
                    endpoint
                ));
            }
        }
        if self.api_key.is_none() && self.api_key_env.trim().is_empty() {
            return Err("Either api_key or api_key_env must be set".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Resolve the credential: inline `api_key` first, then the `api_key_env` variable.
    pub fn resolve_api_key(&self) -> Result<String, ApiError> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.clone());
        }
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ApiError::ProviderNotConfigured(format!(
                "No API key: set {} or provider.api_key",
                self.api_key_env
            ))),
        }
    }

    /// Convert to a ready-to-use provider, resolving the credential.
    pub fn to_model_provider(&self) -> Result<ModelProvider, ApiError> {
        self.validate().map_err(ApiError::ConfigError)?;
        let api_key = self.resolve_api_key()?;
        Ok(match self.provider_type {
            ProviderType::Anthropic => ModelProvider::Anthropic {
                model: self.model.clone(),
                api_key,
                base_url: self.endpoint.clone(),
                timeout_secs: self.request_timeout_secs,
            },
            ProviderType::OpenAI => ModelProvider::OpenAI {
                model: self.model.clone(),
                api_key,
                base_url: self.endpoint.clone(),
                timeout_secs: self.request_timeout_secs,
            },
        })
    }
}

//! Credential and endpoint configuration, loaded once at process entry.
//!
//! Values come from the environment, optionally seeded from a local
//! `credentials.env` file. Missing required variables fail fast with the
//! variable name instead of surfacing later as an HTTP 401.

use std::env;

/// Local file holding API credentials; absence is fine if the variables
/// are already in the environment.
pub const CREDENTIALS_FILE: &str = "credentials.env";

const DEFAULT_DEPLOYMENT: &str = "gpt-35-turbo-16k";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set (add it to credentials.env)")]
    MissingVar(&'static str),
}

/// API key wrapper whose `Debug` output never reveals the key.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

#[derive(Debug, Clone)]
pub struct BingConfig {
    pub subscription_key: ApiKey,
    pub endpoint: String,
}

#[derive(Debug, Clone)]
pub struct AzureOpenAiConfig {
    pub endpoint: String,
    pub api_key: ApiKey,
    pub api_version: String,
    pub deployment: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bing: BingConfig,
    pub azure: AzureOpenAiConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Missing file is not an error; plain environment variables work too.
        let _ = dotenvy::from_filename(CREDENTIALS_FILE);

        Ok(Self {
            bing: BingConfig {
                subscription_key: ApiKey(required("BING_SUBSCRIPTION_KEY")?),
                endpoint: required("BING_SEARCH_URL")?,
            },
            azure: AzureOpenAiConfig {
                endpoint: required("AZURE_OPENAI_ENDPOINT")?,
                api_key: ApiKey(required("AZURE_OPENAI_API_KEY")?),
                api_version: required("AZURE_OPENAI_API_VERSION")?,
                deployment: optional("AZURE_OPENAI_DEPLOYMENT")
                    .unwrap_or_else(|| DEFAULT_DEPLOYMENT.to_string()),
            },
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::MissingVar(name))
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

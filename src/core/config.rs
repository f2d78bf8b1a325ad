use std::env;
use std::time::Duration;

use thiserror::Error;

pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";
pub const API_HOST_VAR: &str = "KRISHNA_API_HOST";
pub const MODEL_VAR: &str = "KRISHNA_MODEL";
pub const MAX_TOKENS_VAR: &str = "KRISHNA_MAX_TOKENS";
pub const TIMEOUT_VAR: &str = "KRISHNA_REQUEST_TIMEOUT_SECS";

pub const DEFAULT_API_HOST: &str = "https://openrouter.ai/api";
pub const DEFAULT_MODEL: &str = "mistralai/mistral-7b-instruct";
pub const DEFAULT_MAX_TOKENS: u32 = 150;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("🚨 {0} is not set! Please add it to your .env file.")]
    MissingCredential(String),

    #[error("Invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: String,
        value: String,
        reason: String,
    },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub openai_api_hostname: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub max_tokens: u32,
    /// `None` leaves the request without a client side timeout.
    pub request_timeout: Option<Duration>,
}

impl AppConfig {
    /// Reads the config from the process environment after loading a
    /// `.env` file from the working directory, if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine, the variables can come from
        // the shell instead
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so it can be
    /// constructed without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = lookup(API_KEY_VAR)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingCredential(API_KEY_VAR.to_string()))?;
        let openai_api_hostname =
            lookup(API_HOST_VAR).unwrap_or_else(|| DEFAULT_API_HOST.to_string());
        let openai_model = lookup(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let max_tokens = match lookup(MAX_TOKENS_VAR) {
            Some(v) => parse_var(MAX_TOKENS_VAR, &v)?,
            None => DEFAULT_MAX_TOKENS,
        };
        let request_timeout = match lookup(TIMEOUT_VAR) {
            Some(v) => Some(timeout_from_secs(TIMEOUT_VAR, parse_var(TIMEOUT_VAR, &v)?)?),
            None => None,
        };

        Ok(Self {
            openai_api_hostname,
            openai_api_key,
            openai_model,
            max_tokens,
            request_timeout,
        })
    }
}

/// A zero timeout would fail every request, so it's rejected rather
/// than passed to the client.
pub fn timeout_from_secs(var: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Invalid {
            var: var.to_string(),
            value: secs.to_string(),
            reason: "timeout must be at least one second".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn parse_var<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        var: var.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

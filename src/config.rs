use std::{str::FromStr, time::Duration};

use crate::{
    error::{RelayError, Result},
    services::openai_client::DEFAULT_BASE_URL,
    types::DEFAULT_MAX_FIELD_CHARS,
};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f64 = 0.8;
pub const DEFAULT_MAX_TOKENS: u32 = 700;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 50 * 1024;

/// Process configuration for the relay server.
#[derive(Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// Completion API credential. Absence is allowed at startup and
    /// reported on the first planning request.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub max_field_chars: usize,
    pub body_limit_bytes: usize,
    /// Single allowed CORS origin; any origin when unset
    pub cors_allow_origin: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
            max_field_chars: DEFAULT_MAX_FIELD_CHARS,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            cors_allow_origin: None,
        }
    }
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .field("max_field_chars", &self.max_field_chars)
            .field("body_limit_bytes", &self.body_limit_bytes)
            .field("cors_allow_origin", &self.cors_allow_origin)
            .finish()
    }
}

impl RelayConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, starting from the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = get("HOST") {
            config.host = host;
        }
        if let Some(port) = get("PORT") {
            config.port = parse_var("PORT", &port)?;
        }
        config.api_key = get("OPENAI_API_KEY");
        if let Some(base_url) = get("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(model) = get("OPENAI_MODEL") {
            config.model = model;
        }
        if let Some(temperature) = get("OPENAI_TEMPERATURE") {
            config.temperature = parse_var("OPENAI_TEMPERATURE", &temperature)?;
        }
        if let Some(max_tokens) = get("OPENAI_MAX_TOKENS") {
            config.max_tokens = parse_var("OPENAI_MAX_TOKENS", &max_tokens)?;
        }
        if let Some(timeout) = get("OPENAI_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_var("OPENAI_TIMEOUT_SECS", &timeout)?);
        }
        if let Some(max_chars) = get("MAX_FIELD_CHARS") {
            config.max_field_chars = parse_var("MAX_FIELD_CHARS", &max_chars)?;
        }
        config.cors_allow_origin = get("CORS_ALLOW_ORIGIN");

        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|err| RelayError::Config(format!("{key} has invalid value `{raw}`: {err}")))
}

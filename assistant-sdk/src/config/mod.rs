//! Settings for the assistant client and the services built on it
//!
//! Values come from a [`ConfigProvider`]: the process environment in
//! production (`REPORT_*` variables), an in-memory table in tests.

use std::collections::HashMap;
use std::env;
use std::fmt::{self, Debug};
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{AssistantError, Result};

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Feature-version header value required by the threads/runs endpoints
pub const DEFAULT_BETA_HEADER: &str = "assistants=v2";

/// Source of raw string settings
pub trait ConfigProvider: Send + Sync {
    /// Raw value for `key`; a missing key is a `Configuration` error
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Typed accessors layered on top of [`ConfigProvider::get_string`]
pub trait ConfigProviderExt: ConfigProvider {
    /// Value parsed as `i64`
    fn get_int(&self, key: &str) -> Result<i64> {
        let raw = self.get_string(key)?;
        raw.trim()
            .parse::<i64>()
            .map_err(|e| AssistantError::configuration(format!("{} is not an integer ({}): {}", key, raw, e)))
    }

    /// Value, or `default` when the key is absent
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }

    /// Integer value, or `default` when the key is absent
    ///
    /// A present but malformed value is an error rather than a silent default.
    fn get_int_or(&self, key: &str, default: i64) -> Result<i64> {
        match self.get_string(key) {
            Ok(_) => self.get_int(key),
            Err(_) => Ok(default),
        }
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Reads `<PREFIX>_<KEY>` from the process environment
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    prefix: Option<String>,
}

impl EnvConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// `openai_api_key` -> `REPORT_OPENAI_API_KEY`
    pub fn format_key(&self, key: &str) -> String {
        let name = key
            .to_uppercase()
            .replace(|c: char| !c.is_ascii_alphanumeric(), "_");

        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix, name),
            None => name,
        }
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let var = self.format_key(key);

        env::var(&var).map_err(|e| match e {
            env::VarError::NotPresent => AssistantError::configuration(format!("{} is not set", var)),
            env::VarError::NotUnicode(_) => {
                AssistantError::configuration(format!("{} is not valid unicode", var))
            }
        })
    }
}

/// Fixed key/value table, mostly for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    entries: HashMap<String, String>,
}

impl MemoryConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.entries.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| AssistantError::configuration(format!("Missing setting {}", key)))
    }
}

/// Environment provider for `REPORT_*` variables
pub static DEFAULT_PROVIDER: Lazy<Arc<EnvConfigProvider>> =
    Lazy::new(|| Arc::new(EnvConfigProvider::new().with_prefix("REPORT")));

/// A settings struct that can check its own required fields
pub trait ServiceConfig: Debug + Send + Sync {
    fn validate(&self) -> Result<()>;

    fn service_name(&self) -> &str;
}

/// Connection settings for the assistant API
#[derive(Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// API key sent as a bearer token
    pub api_key: String,

    /// Base URL (can be changed for proxies and tests)
    pub base_url: String,

    /// Value of the `OpenAI-Beta` header
    pub beta_header: String,

    /// Per-request timeout, seconds
    pub timeout_seconds: u64,
}

impl Debug for AssistantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("beta_header", &self.beta_header)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            beta_header: DEFAULT_BETA_HEADER.to_string(),
            timeout_seconds: 30,
        }
    }
}

impl AssistantConfig {
    /// Read `openai_*` keys; only the API key is required
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let timeout_seconds = provider.get_int_or("openai_timeout_seconds", 30)?;
        let config = Self {
            api_key: provider.get_string("openai_api_key")?,
            base_url: provider.get_string_or("openai_base_url", DEFAULT_BASE_URL),
            beta_header: provider.get_string_or("openai_beta_header", DEFAULT_BETA_HEADER),
            timeout_seconds: u64::try_from(timeout_seconds).map_err(|_| {
                AssistantError::configuration(format!("Invalid openai_timeout_seconds: {}", timeout_seconds))
            })?,
        };

        config.validate()?;
        Ok(config)
    }
}

impl ServiceConfig for AssistantConfig {
    fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(AssistantError::configuration("Assistant API key is required"));
        }

        if self.base_url.is_empty() {
            return Err(AssistantError::configuration("Assistant base URL is required"));
        }

        if self.timeout_seconds == 0 {
            return Err(AssistantError::configuration("Timeout must be greater than zero"));
        }

        Ok(())
    }

    fn service_name(&self) -> &str {
        "assistants"
    }
}

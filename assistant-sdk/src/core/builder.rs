//! HTTP client construction

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Client as ReqwestClient;

use crate::error::{AssistantError, Result};

/// Default user agent
pub const DEFAULT_USER_AGENT: &str = concat!("assistant-sdk/", env!("CARGO_PKG_VERSION"));

/// Assembles the shared `reqwest::Client`
///
/// Authentication and feature headers become default headers, so
/// individual requests only set method, path and body.
pub struct ClientBuilder {
    auth_token: Option<String>,
    custom_headers: HashMap<String, String>,
    timeout: Duration,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            auth_token: None,
            custom_headers: HashMap::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sent as `Authorization: Bearer <token>`, marked sensitive
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.insert(name.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Header map installed on every request
    pub fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::with_capacity(self.custom_headers.len() + 1);

        for (name, value) in &self.custom_headers {
            let name = HeaderName::from_str(name)
                .map_err(|e| AssistantError::configuration(format!("Invalid header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| AssistantError::configuration(format!("Invalid value for header {}: {}", name, e)))?;
            headers.insert(name, value);
        }

        if let Some(token) = &self.auth_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| AssistantError::configuration("API key contains characters not allowed in a header"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    pub fn build_http_client(&self) -> Result<ReqwestClient> {
        ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .gzip(true)
            .default_headers(self.default_headers()?)
            .build()
            .map_err(|e| AssistantError::configuration(format!("Failed to build HTTP client: {}", e)))
    }
}

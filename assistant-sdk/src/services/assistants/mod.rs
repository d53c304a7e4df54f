//! Assistant threads/runs API client implementation
//!
//! This module provides a strongly-typed client for the thread, message and
//! run endpoints. Every request is authenticated with a bearer token and the
//! `OpenAI-Beta` feature header.

mod models;
pub use models::*;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{AssistantConfig, ConfigProvider, ServiceConfig};
use crate::core::{AssistantApi, ClientBuilder, ServiceClient};
use crate::error::mapping::map_api_error;
use crate::error::{AssistantError, ErrorContext, Result};
use crate::util::{sanitize_for_logging, truncate_string};

const SERVICE_NAME: &str = "assistants";

/// Assistant API client
#[derive(Debug, Clone)]
pub struct AssistantClient {
    /// HTTP client with auth and beta headers preinstalled
    http_client: Client,

    /// Configuration
    config: AssistantConfig,
}

impl AssistantClient {
    /// Create a client from a validated configuration
    pub fn new_with_config(config: AssistantConfig) -> Result<Self> {
        config.validate()?;

        let http_client = ClientBuilder::new()
            .auth_token(&config.api_key)
            .header("OpenAI-Beta", &config.beta_header)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build_http_client()?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Create a client from a configuration provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        Self::new_with_config(AssistantConfig::from_provider(provider)?)
    }

    /// Create a new builder for the assistant client
    pub fn builder() -> AssistantClientBuilder {
        AssistantClientBuilder::default()
    }

    /// Active configuration
    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    async fn post_json<T, R>(&self, endpoint: &str, body: &T, context: ErrorContext) -> Result<R>
    where
        T: Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        let url = self.url(endpoint);
        debug!("Sending request to assistant API: POST {}", url);

        let start_time = Instant::now();
        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AssistantError::from(e).in_context(context.clone()))?;

        self.handle_response(endpoint, response, start_time, context).await
    }

    async fn get_json<R>(&self, endpoint: &str, context: ErrorContext) -> Result<R>
    where
        R: DeserializeOwned + Send,
    {
        let url = self.url(endpoint);
        debug!("Sending request to assistant API: GET {}", url);

        let start_time = Instant::now();
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| AssistantError::from(e).in_context(context.clone()))?;

        self.handle_response(endpoint, response, start_time, context).await
    }

    async fn handle_response<R>(
        &self,
        endpoint: &str,
        response: reqwest::Response,
        start_time: Instant,
        mut context: ErrorContext,
    ) -> Result<R>
    where
        R: DeserializeOwned + Send,
    {
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if status.is_success() => {
                return Err(AssistantError::network(format!("Failed to read response body: {}", e))
                    .with_context(context));
            }
            Err(e) => format!("Failed to read error response: {}", e),
        };

        debug!(
            "Assistant API {} answered {} in {:?}",
            endpoint,
            status.as_u16(),
            start_time.elapsed()
        );

        if !status.is_success() {
            warn!(
                "Assistant API {} failed with {}: {}",
                endpoint,
                status.as_u16(),
                truncate_string(&sanitize_for_logging(&body), 1000)
            );
            let error = map_api_error(status, &body, &mut context);
            return Err(error.with_context(context));
        }

        serde_json::from_str::<R>(&body).map_err(|e| {
            AssistantError::parsing(format!("Failed to parse {} response: {}", endpoint, e))
                .with_context(context.status_code(status.as_u16()))
        })
    }
}

impl ServiceClient for AssistantClient {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn version(&self) -> &str {
        &self.config.beta_header
    }
}

#[async_trait]
impl AssistantApi for AssistantClient {
    async fn create_thread(&self) -> Result<Thread> {
        let context = ErrorContext::for_service(SERVICE_NAME).endpoint("threads");
        self.post_json("threads", &CreateThreadRequest::default(), context)
            .await
    }

    async fn add_message(&self, thread_id: &str, content: &str) -> Result<MessageRef> {
        let endpoint = format!("threads/{}/messages", thread_id);
        let context = ErrorContext::for_service(SERVICE_NAME)
            .endpoint(&endpoint)
            .thread_id(thread_id);
        let request = CreateMessageRequest {
            role: Role::User,
            content: content.to_string(),
        };

        self.post_json(&endpoint, &request, context).await
    }

    async fn start_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run> {
        let endpoint = format!("threads/{}/runs", thread_id);
        let context = ErrorContext::for_service(SERVICE_NAME)
            .endpoint(&endpoint)
            .thread_id(thread_id)
            .with("assistant_id", assistant_id);
        let request = CreateRunRequest {
            assistant_id: assistant_id.to_string(),
        };

        self.post_json(&endpoint, &request, context).await
    }

    async fn get_run_status(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let endpoint = format!("threads/{}/runs/{}", thread_id, run_id);
        let context = ErrorContext::for_service(SERVICE_NAME)
            .endpoint(&endpoint)
            .thread_id(thread_id)
            .run_id(run_id);

        self.get_json(&endpoint, context).await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>> {
        let endpoint = format!("threads/{}/messages", thread_id);
        let context = ErrorContext::for_service(SERVICE_NAME)
            .endpoint(&endpoint)
            .thread_id(thread_id);

        let response: ListMessagesResponse = self.get_json(&endpoint, context).await?;
        Ok(response.data)
    }
}

/// Builder for the assistant client
#[derive(Debug, Default)]
pub struct AssistantClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    beta_header: Option<String>,
    timeout_seconds: Option<u64>,
}

impl AssistantClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Override the `OpenAI-Beta` header value
    pub fn beta_header(mut self, value: impl Into<String>) -> Self {
        self.beta_header = Some(value.into());
        self
    }

    /// Set the timeout in seconds
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Build the assistant client
    pub fn build(self) -> Result<AssistantClient> {
        let mut config = AssistantConfig::default();

        if let Some(api_key) = self.api_key {
            config.api_key = api_key;
        }

        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }

        if let Some(beta_header) = self.beta_header {
            config.beta_header = beta_header;
        }

        if let Some(timeout) = self.timeout_seconds {
            config.timeout_seconds = timeout;
        }

        AssistantClient::new_with_config(config)
    }
}

//! Error taxonomy shared by every remote operation
//!
//! Transport failures (`Network`) are kept apart from remote rejections
//! (`Api`), and both from poll outcomes that never reached `completed`.

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub mod mapping;

pub type Result<T> = std::result::Result<T, AssistantError>;

#[derive(Error, Debug)]
pub enum AssistantError {
    /// The connection to the remote API could not be established or broke
    #[error("Network error: {0}")]
    Network(String),

    /// The remote API answered with a non-success status
    ///
    /// `body` is the raw response body, kept verbatim for diagnostics.
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// A success response could not be decoded
    #[error("Parsing error: {0}")]
    Parsing(String),

    /// Client or service configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The run never reached `completed` within the attempt budget
    #[error("Run {run_id} did not complete after {attempts} attempts (last status: {last_status})")]
    PollExhausted {
        run_id: String,
        attempts: u32,
        last_status: String,
    },

    /// The run reached a terminal state other than `completed`
    #[error("Run {run_id} ended with status {status}")]
    RunTerminated { run_id: String, status: String },

    /// Any of the above plus where it happened
    #[error("{inner}")]
    WithContext {
        inner: Box<AssistantError>,
        context: ErrorContext,
    },
}

impl AssistantError {
    /// Transport-level failure
    pub fn network(message: impl Into<String>) -> Self {
        AssistantError::Network(message.into())
    }

    /// Non-success response; `body` is kept verbatim
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        AssistantError::Api {
            status,
            body: body.into(),
        }
    }

    pub fn parsing(message: impl Into<String>) -> Self {
        AssistantError::Parsing(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        AssistantError::Configuration(message.into())
    }

    /// Wrap in a context layer
    pub fn with_context(self, context: ErrorContext) -> Self {
        AssistantError::WithContext {
            inner: Box::new(self),
            context,
        }
    }

    /// Add one key/value to the outermost context, creating it if needed
    pub fn with_context_value(self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        match self {
            AssistantError::WithContext { inner, mut context } => {
                context.add(key, value);
                AssistantError::WithContext { inner, context }
            }
            other => {
                let mut context = ErrorContext::new();
                context.add(key, value);
                other.with_context(context)
            }
        }
    }

    /// Replace any existing context layers with `context`
    pub fn in_context(self, context: ErrorContext) -> Self {
        match self {
            AssistantError::WithContext { inner, .. } => (*inner).in_context(context),
            other => other.with_context(context),
        }
    }

    /// The underlying error with every context layer removed
    pub fn root(&self) -> &AssistantError {
        match self {
            AssistantError::WithContext { inner, .. } => inner.root(),
            other => other,
        }
    }

    /// The outermost context attached to this error, if any
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            AssistantError::WithContext { context, .. } => Some(context),
            _ => None,
        }
    }

    /// HTTP status of an `Api` error, else the status recorded in context
    pub fn status_code(&self) -> Option<u16> {
        match self.root() {
            AssistantError::Api { status, .. } => Some(*status),
            _ => self.context().and_then(|c| c.status_code),
        }
    }

    /// Raw response body of an API error
    pub fn body(&self) -> Option<&str> {
        match self.root() {
            AssistantError::Api { body, .. } => Some(body.as_str()),
            _ => None,
        }
    }

    /// `error.code` lifted from the API's error envelope
    pub fn error_code(&self) -> Option<&str> {
        self.context().and_then(|c| c.error_code.as_deref())
    }

    /// Whether the failure happened at the transport level
    pub fn is_network(&self) -> bool {
        matches!(self.root(), AssistantError::Network(_))
    }

    /// Whether the remote service rejected the request
    pub fn is_api(&self) -> bool {
        matches!(self.root(), AssistantError::Api { .. })
    }
}

/// Where and when a failure happened
///
/// Attached to errors so a failed call can be reproduced from the log line
/// alone: which endpoint, which thread and run, and what the API said.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub service: String,
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
    pub status_code: Option<u16>,
    /// `error.code` from the API's error envelope
    pub error_code: Option<String>,
    /// Path relative to the base URL, e.g. `threads/{id}/runs`
    pub endpoint: Option<String>,
    pub thread_id: Option<String>,
    pub run_id: Option<String>,
    pub data: HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::for_service("unknown")
    }
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            timestamp: Some(chrono::Utc::now()),
            status_code: None,
            error_code: None,
            endpoint: None,
            thread_id: None,
            run_id: None,
            data: HashMap::new(),
        }
    }

    pub fn status_code(self, code: u16) -> Self {
        Self {
            status_code: Some(code),
            ..self
        }
    }

    pub fn endpoint(self, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            ..self
        }
    }

    pub fn thread_id(self, thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            ..self
        }
    }

    pub fn run_id(self, run_id: impl Into<String>) -> Self {
        Self {
            run_id: Some(run_id.into()),
            ..self
        }
    }

    /// Record a free-form key/value
    pub fn add(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        self.data.insert(key.into(), value.to_string());
    }

    /// [`ErrorContext::add`] in builder form
    pub fn with(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.add(key, value);
        self
    }
}

/// Decode failures become `Parsing`; everything else is `Network`
impl From<reqwest::Error> for AssistantError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        let error = if err.is_decode() {
            AssistantError::parsing(format!("Undecodable response: {}", message))
        } else if err.is_timeout() {
            AssistantError::network(format!("Timed out: {}", message))
        } else if err.is_connect() {
            AssistantError::network(format!("Could not connect: {}", message))
        } else {
            AssistantError::network(message)
        };

        let context = ErrorContext::for_service("http");
        error.with_context(match err.status() {
            Some(status) => context.status_code(status.as_u16()),
            None => context,
        })
    }
}

//! Assistant API data models
//!
//! Request bodies are serialized exactly as the threads/runs endpoints expect.
//! Response types only require the fields the workflow reads; everything
//! else is optional so that additive API changes do not break decoding.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A remote conversation thread
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thread {
    /// Opaque thread identifier
    pub id: String,

    /// Object type, `thread`
    #[serde(default)]
    pub object: Option<String>,

    /// Creation timestamp (unix seconds)
    #[serde(default)]
    pub created_at: Option<u64>,

    /// Key/value metadata attached to the thread
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

/// Message author role
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// End-user message
    User,
    /// Assistant-authored message
    Assistant,
    /// Any role this client does not know about
    #[serde(other)]
    Unknown,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Unknown => write!(f, "unknown"),
        }
    }
}

/// Reference to a message that was just created
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageRef {
    /// Message identifier
    pub id: String,

    /// Thread the message belongs to
    #[serde(default)]
    pub thread_id: Option<String>,

    /// Author role
    #[serde(default)]
    pub role: Option<Role>,
}

/// Text payload of a structured content part
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextContent {
    /// The text itself
    pub value: String,

    /// Citations and file references; kept opaque
    #[serde(default)]
    pub annotations: Vec<serde_json::Value>,
}

/// A structured content part such as `{"type": "text", "text": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructuredPart {
    /// Part type (`text`, `image_file`, ...)
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    /// Text payload, present for `text` parts
    #[serde(default)]
    pub text: Option<TextContent>,
}

/// One element of a message's content sequence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ContentPart {
    /// A bare string
    Plain(String),
    /// A typed object carrying nested text
    Structured(StructuredPart),
}

impl ContentPart {
    /// Build a structured text part
    pub fn text(value: impl Into<String>) -> Self {
        ContentPart::Structured(StructuredPart {
            kind: Some("text".to_string()),
            text: Some(TextContent {
                value: value.into(),
                annotations: Vec::new(),
            }),
        })
    }

    /// The text this part contributes, if any
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Plain(value) => Some(value.as_str()),
            ContentPart::Structured(part) => part.text.as_ref().map(|t| t.value.as_str()),
        }
    }
}

/// A message in a thread
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Message identifier
    #[serde(default)]
    pub id: Option<String>,

    /// Author role
    pub role: Role,

    /// Ordered content parts
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

impl Message {
    /// Build a message from text parts
    pub fn new(role: Role, parts: Vec<ContentPart>) -> Self {
        Self {
            id: None,
            role,
            content: parts,
        }
    }
}

/// Lifecycle state of a run
///
/// Unknown values are preserved verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    Other(String),
}

impl RunStatus {
    /// Wire representation
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
            RunStatus::Other(value) => value.as_str(),
        }
    }

    /// Whether the run finished successfully
    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }

    /// Whether the run stopped without completing
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self,
            RunStatus::Cancelled | RunStatus::Failed | RunStatus::Incomplete | RunStatus::Expired
        )
    }
}

impl From<String> for RunStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "queued" => RunStatus::Queued,
            "in_progress" => RunStatus::InProgress,
            "requires_action" => RunStatus::RequiresAction,
            "cancelling" => RunStatus::Cancelling,
            "cancelled" => RunStatus::Cancelled,
            "failed" => RunStatus::Failed,
            "completed" => RunStatus::Completed,
            "incomplete" => RunStatus::Incomplete,
            "expired" => RunStatus::Expired,
            _ => RunStatus::Other(value),
        }
    }
}

impl From<RunStatus> for String {
    fn from(status: RunStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error reported by the remote service for a failed run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunError {
    /// Error code
    pub code: String,

    /// Human-readable description
    pub message: String,
}

/// A unit of work processing a thread
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Run {
    /// Run identifier
    pub id: String,

    /// Thread the run belongs to
    #[serde(default)]
    pub thread_id: Option<String>,

    /// Assistant executing the run
    #[serde(default)]
    pub assistant_id: Option<String>,

    /// Current state
    pub status: RunStatus,

    /// Failure details when the run failed
    #[serde(default)]
    pub last_error: Option<RunError>,
}

/// Body of `POST /threads`
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateThreadRequest {}

/// Body of `POST /threads/{id}/messages`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateMessageRequest {
    /// Always `user` for this workflow
    pub role: Role,

    /// Message text
    pub content: String,
}

/// Body of `POST /threads/{id}/runs`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateRunRequest {
    /// Assistant to run
    pub assistant_id: String,
}

/// Response of `GET /threads/{id}/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMessagesResponse {
    /// Messages in API order
    pub data: Vec<Message>,

    #[serde(default)]
    pub first_id: Option<String>,

    #[serde(default)]
    pub last_id: Option<String>,

    #[serde(default)]
    pub has_more: bool,
}

//! Core abstractions for the Assistant SDK
//!
//! - `ServiceClient`: identity of a remote service client
//! - `AssistantApi`: the thread/run operations, one HTTP call each
//! - `ClientBuilder`: builder for the underlying HTTP client

pub mod builder;
pub use builder::ClientBuilder;

use async_trait::async_trait;

use crate::error::Result;
use crate::services::assistants::{Message, MessageRef, Run, Thread};

/// Base trait for all service clients
pub trait ServiceClient: Send + Sync {
    /// The client name/identifier
    fn name(&self) -> &str;

    /// The base URL for the service
    fn base_url(&self) -> &str;

    /// Service version
    fn version(&self) -> &str;
}

/// The remote assistant operations used by the report workflow
///
/// Every call is a single request. None of them retry; retry policy for
/// run status lives in [`crate::resilience::RunPoller`].
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Create an empty conversation thread
    async fn create_thread(&self) -> Result<Thread>;

    /// Append a user message to a thread
    async fn add_message(&self, thread_id: &str, content: &str) -> Result<MessageRef>;

    /// Start an assistant run on a thread
    async fn start_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run>;

    /// Fetch the current state of a run
    async fn get_run_status(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// List the messages of a thread in the order the API returns them
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>>;
}

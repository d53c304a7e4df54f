// report-service-rs/src/extractor.rs
// Pulls the assistant's reply text out of a thread's message list

use assistant_sdk::assistants::{ContentPart, Message, Role};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No assistant message in thread")]
pub struct NoAssistantReply;

/// Text of the first assistant message, in API order
///
/// Parts are concatenated with no separator. An assistant message with no
/// content yields an empty string.
pub fn extract(messages: &[Message]) -> Result<String, NoAssistantReply> {
    let reply = messages
        .iter()
        .find(|m| m.role == Role::Assistant)
        .ok_or(NoAssistantReply)?;

    Ok(reply
        .content
        .iter()
        .filter_map(ContentPart::as_text)
        .collect())
}

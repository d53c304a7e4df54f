// report-service-rs/src/mail.rs
// Mail delivery collaborator

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("Failed to write message: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Writes each message as an `.eml` file into an outbox directory
#[derive(Debug, Clone)]
pub struct OutboxMailer {
    outbox_dir: PathBuf,
    from: String,
}

impl OutboxMailer {
    pub fn new(outbox_dir: impl Into<PathBuf>, from: impl Into<String>) -> Self {
        Self {
            outbox_dir: outbox_dir.into(),
            from: from.into(),
        }
    }
}

fn has_line_break(value: &str) -> bool {
    value.contains(['\r', '\n'])
}

/// RFC 822 style message text
pub fn format_message(from: &str, recipient: &str, subject: &str, body: &str) -> Result<String, MailError> {
    if !recipient.contains('@') || has_line_break(recipient) {
        return Err(MailError::InvalidRecipient(recipient.to_string()));
    }
    if has_line_break(subject) {
        return Err(MailError::InvalidHeader("Subject"));
    }
    if has_line_break(from) {
        return Err(MailError::InvalidHeader("From"));
    }

    Ok(format!(
        "From: {}\r\nTo: {}\r\nSubject: {}\r\nDate: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}\r\n",
        from,
        recipient,
        subject,
        Utc::now().to_rfc2822(),
        body
    ))
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let message = format_message(&self.from, recipient, subject, body)?;

        tokio::fs::create_dir_all(&self.outbox_dir).await?;
        let file_name = format!("{}-{}.eml", Utc::now().format("%Y%m%dT%H%M%S"), Uuid::new_v4());
        let path = self.outbox_dir.join(file_name);

        debug!("Writing {} bytes to {}", message.len(), path.display());
        tokio::fs::write(&path, message).await?;

        info!("Queued mail to {} at {}", recipient, path.display());
        Ok(())
    }
}

// report-service-rs/src/recipients.rs
// Maps user ids to mail addresses

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

#[cfg_attr(test, mockall::automock)]
pub trait RecipientResolver: Send + Sync {
    /// Address for the user, or None when the user is unknown
    fn resolve(&self, user_id: &str) -> Option<String>;
}

/// Resolver backed by a fixed user id -> address table
#[derive(Debug, Clone, Default)]
pub struct MapRecipientResolver {
    addresses: HashMap<String, String>,
}

impl MapRecipientResolver {
    pub fn new(addresses: HashMap<String, String>) -> Self {
        Self { addresses }
    }

    /// Load a `{"<user_id>": "<email>"}` JSON file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read recipients file {}", path.display()))?;
        let addresses: HashMap<String, String> = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid recipients file {}", path.display()))?;
        Ok(Self::new(addresses))
    }
}

impl RecipientResolver for MapRecipientResolver {
    fn resolve(&self, user_id: &str) -> Option<String> {
        self.addresses.get(user_id).cloned()
    }
}

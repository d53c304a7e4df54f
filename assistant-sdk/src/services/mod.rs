//! Service-specific client implementations

pub mod assistants;

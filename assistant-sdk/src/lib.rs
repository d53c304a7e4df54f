//! # Assistant SDK
//!
//! A typed client for the remote assistant threads/runs API.
//!
//! This crate provides:
//!
//! - `AssistantApi`: the five thread/run operations as an async trait
//! - `AssistantClient`: the HTTP implementation of that trait
//! - `RunPoller`: bounded poll-until-complete with a pluggable `PollPolicy`
//! - `AssistantError`: the error taxonomy shared by every operation
//! - Configuration providers backed by environment variables or memory
//!
//! ## Architecture
//!
//! Threads, runs and messages are owned by the remote service. The SDK only
//! holds their identifiers and the snapshots it fetched, so every model type
//! is a plain value with no release step.

pub mod core;
pub use self::core::{AssistantApi, ClientBuilder, ServiceClient};

pub mod services;
pub use services::assistants;

pub mod error;
pub use error::{AssistantError, ErrorContext, Result};

pub mod resilience;
pub use resilience::{
    ExponentialPolicy, FixedInterval, PollPolicy, RunPoller, TerminalStatePolicy,
};

pub mod config;
pub use config::{AssistantConfig, ConfigProvider, ConfigProviderExt, ServiceConfig};

pub mod util;

#[cfg(test)]
mod tests;

//! Unit tests for the Assistant SDK
//!
//! This module contains tests that drive the HTTP client against a mock server.

pub mod poller_http_tests;

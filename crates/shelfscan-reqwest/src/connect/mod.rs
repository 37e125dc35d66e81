//! Reqwest client module.
//!
//! This module provides the main client interface for the recognition API:
//! configuration, connection setup, and the REST operations.

mod client;
mod config;

pub use client::{ScanClient, TRACING_TARGET};
pub use config::{DEFAULT_BASE_URL, ENV_API_KEY, ENV_API_URL, ScanConfig, ScanConfigBuilder};

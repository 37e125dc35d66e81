#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod connect;
mod error;
mod service;
mod upload;

pub use crate::connect::{
    DEFAULT_BASE_URL, ENV_API_KEY, ENV_API_URL, ScanClient, ScanConfig, ScanConfigBuilder,
    TRACING_TARGET,
};
pub use crate::upload::ImageUpload;

// Domain types live in shelfscan-core; re-exported for convenience.
pub use shelfscan_core::{Error, Result};

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod error;
pub mod models;
pub mod poll;
#[doc(hidden)]
pub mod prelude;

pub use crate::error::{Error, Result};
pub use crate::models::{
    CatalogItem, ImageSubmission, Page, PageQuery, RecognitionResult, RecognitionTask,
    RecognizedItem, StatusPayload, StatusRecord,
};
pub use crate::poll::{PollConfig, PollPhase, PollState, StatusPoller};

/// Tracing target for polling operations.
pub const TRACING_TARGET_POLL: &str = "shelfscan_core::poll";

/// Source of status records for the poller.
///
/// Implemented by `shelfscan-reqwest` over the REST API; tests implement it
/// with scripted responses.
#[async_trait::async_trait]
pub trait StatusProvider: Send + Sync {
    /// Fetch the current status of one submitted image.
    ///
    /// Implementations return [`Error::NotFound`] when the submission is not
    /// registered yet and [`Error::Unauthorized`] when the credentials are
    /// rejected; the poller's retry policy depends on this classification.
    async fn fetch_status(&self, task_uuid: &str, image_id: &str) -> Result<StatusRecord>;
}

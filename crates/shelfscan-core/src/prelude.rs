//! Prelude for the shelfscan-core crate
//!
//! This module re-exports the most commonly used types and traits from the crate
//! to provide a convenient single import for users.

pub use crate::error::{Error, Result};
pub use crate::models::{
    CatalogItem, ImageSubmission, Page, PageQuery, RecognitionResult, RecognitionTask,
    RecognizedItem, StatusPayload, StatusRecord,
};
pub use crate::poll::{PollConfig, PollState, StatusPoller};
pub use crate::StatusProvider;

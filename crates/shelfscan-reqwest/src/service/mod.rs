//! Status provider implementation.
//!
//! This module implements the [`StatusProvider`] trait for [`ScanClient`],
//! letting a [`StatusPoller`](shelfscan_core::StatusPoller) poll the status
//! endpoint through this client.

use shelfscan_core::{Result, StatusProvider, StatusRecord};

use crate::connect::{ScanClient, TRACING_TARGET};

#[async_trait::async_trait]
impl StatusProvider for ScanClient {
    async fn fetch_status(&self, task_uuid: &str, image_id: &str) -> Result<StatusRecord> {
        tracing::debug!(
            target: TRACING_TARGET,
            task_uuid = %task_uuid,
            image_id = %image_id,
            "Polling image status"
        );

        self.image_status(task_uuid, image_id).await
    }
}

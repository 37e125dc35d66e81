//! Submission and status types for image-recognition tasks.

use serde::{Deserialize, Serialize};

/// Status tag reported while an image is still being processed.
///
/// Compared case-insensitively; every other tag is terminal.
pub const PENDING_STATUS: &str = "pending";

/// Result of uploading one image to a recognition task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSubmission {
    /// Task the image was submitted to.
    pub task_uuid: String,
    /// Identifier assigned to the uploaded image.
    pub image_id: String,
    /// Initial processing status, when the API reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Wire shape of the status endpoint response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    /// Processing status tag. Open-ended; unknown values pass through.
    pub status: String,
    /// Recognition output, present once processing has produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<RecognitionResult>,
}

impl StatusPayload {
    /// Bind this payload to the `(task, image)` pair that produced it.
    pub fn into_record(
        self,
        task_uuid: impl Into<String>,
        image_id: impl Into<String>,
    ) -> StatusRecord {
        StatusRecord {
            task_uuid: task_uuid.into(),
            image_id: image_id.into(),
            status: self.status,
            result: self.result,
        }
    }
}

/// The latest known recognition status for one `(task, image)` pair.
///
/// Records are superseded wholesale by the next poll; they are never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Task the image was submitted to.
    pub task_uuid: String,
    /// Identifier of the submitted image.
    pub image_id: String,
    /// Processing status tag, carried verbatim from the API.
    pub status: String,
    /// Recognition output, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<RecognitionResult>,
}

impl StatusRecord {
    /// Check whether the upstream job is still processing.
    pub fn is_pending(&self) -> bool {
        self.status.eq_ignore_ascii_case(PENDING_STATUS)
    }

    /// Check whether this record ends automatic polling.
    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }
}

/// Recognition output attached to a completed status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// Products recognized in the submitted image.
    #[serde(default = "Vec::new")]
    pub recognized_items: Vec<RecognizedItem>,
}

/// One recognized product with its confidence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedItem {
    /// Catalog identifier of the recognized product.
    pub item_id: String,
    /// Confidence score in `[0, 1]`.
    pub confidence: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_is_case_insensitive() {
        for status in ["pending", "PENDING", "Pending"] {
            let record = StatusPayload {
                status: status.to_string(),
                result: None,
            }
            .into_record("t", "i");
            assert!(record.is_pending(), "{status} should be pending");
            assert!(!record.is_terminal());
        }
    }

    #[test]
    fn test_unknown_status_passes_through_and_is_terminal() {
        let payload: StatusPayload =
            serde_json::from_str(r#"{ "status": "quarantined" }"#).unwrap();
        let record = payload.into_record("task-1", "img-1");
        assert_eq!(record.status, "quarantined");
        assert!(record.is_terminal());
        assert!(record.result.is_none());
    }

    #[test]
    fn test_completed_payload_with_result() {
        let body = r#"{
            "status": "completed",
            "result": {
                "recognized_items": [
                    { "item_id": "sku-1", "confidence": 0.87 }
                ]
            }
        }"#;

        let payload: StatusPayload = serde_json::from_str(body).unwrap();
        let record = payload.into_record("task2", "img123");

        assert_eq!(record.task_uuid, "task2");
        assert_eq!(record.image_id, "img123");
        assert_eq!(record.status, "completed");

        let result = record.result.unwrap();
        assert_eq!(result.recognized_items.len(), 1);
        assert_eq!(result.recognized_items[0].item_id, "sku-1");
        assert_eq!(result.recognized_items[0].confidence, 0.87);
    }

    #[test]
    fn test_submission_without_status() {
        let submission: ImageSubmission =
            serde_json::from_str(r#"{ "task_uuid": "t1", "image_id": "i1" }"#).unwrap();
        assert_eq!(submission.image_id, "i1");
        assert!(submission.status.is_none());
    }

    #[test]
    fn test_result_defaults_to_empty_items() {
        let result: RecognitionResult = serde_json::from_str("{}").unwrap();
        assert!(result.recognized_items.is_empty());
    }
}

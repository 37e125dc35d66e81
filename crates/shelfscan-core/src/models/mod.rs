//! Wire types for the recognition API.
//!
//! These mirror the JSON shapes of the upstream service. Optional fields
//! default when absent and unknown status tags pass through verbatim.

mod status;

use serde::{Deserialize, Serialize};

pub use status::{ImageSubmission, RecognitionResult, RecognizedItem, StatusPayload, StatusRecord};

/// A named image-recognition job definition against which images are submitted.
///
/// Tasks are created upstream and are read-only to this client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionTask {
    /// Unique identifier of the task.
    pub uuid: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// A single product in the catalog.
///
/// Only `uuid`, `name` and `status` are guaranteed by the API; the
/// remaining attributes depend on how the item was ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Unique identifier of the item.
    pub uuid: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Ingestion status of the item (e.g. "ready").
    #[serde(default)]
    pub status: String,
    /// Thumbnail image URL, if one has been generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// EAN/UPC barcode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    /// Caller-assigned identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    /// Brand name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Pack size label (e.g. "330ml").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Container type (e.g. "can", "bottle").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_type: Option<String>,
    /// Flavour variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavour: Option<String>,
    /// Packaging size label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packaging_size: Option<String>,
    /// Physical width, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Physical height, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Physical depth, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,
    /// Creation timestamp, carried verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last-update timestamp, carried verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// List envelope returned by the catalog and task listing endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// Total number of items across all pages, when the API reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl<T> Page<T> {
    /// Check whether this page carries no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: None,
        }
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Query parameters for paged listing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    /// Maximum number of items to return.
    pub limit: u32,
    /// Number of items to skip.
    pub offset: u32,
}

impl PageQuery {
    /// Create a query for the given page window.
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

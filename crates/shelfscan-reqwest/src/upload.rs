//! Image payloads for submission.

use shelfscan_core::{Error, Result};

/// One image to submit to a recognition task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// File name reported in the multipart form.
    pub file_name: String,
    /// MIME type of the image.
    pub mime_type: String,
    /// Raw image bytes.
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Create an upload with an explicit MIME type.
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Create an upload, deriving the MIME type from the file extension.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let file_name = file_name.into();
        let mime_type = mime_for_file_name(&file_name)?;
        Ok(Self {
            file_name,
            mime_type: mime_type.to_string(),
            bytes,
        })
    }

    /// Check the upload is submittable.
    pub fn validate(&self) -> Result<()> {
        if self.file_name.trim().is_empty() {
            return Err(Error::validation("file name must not be empty"));
        }
        if self.bytes.is_empty() {
            return Err(Error::validation("image payload must not be empty"));
        }
        Ok(())
    }
}

/// Determine the MIME type from a file name's extension.
fn mime_for_file_name(file_name: &str) -> Result<&'static str> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .ok_or_else(|| Error::validation(format!("File '{}' has no extension", file_name)))?;

    match extension.to_ascii_lowercase().as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "gif" => Ok("image/gif"),
        "bmp" => Ok("image/bmp"),
        "webp" => Ok("image/webp"),
        "tiff" | "tif" => Ok("image/tiff"),
        ext => Err(Error::validation(format!(
            "Unsupported image extension: {}",
            ext
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_from_extension() {
        let upload = ImageUpload::from_bytes("shelf.JPG", vec![1, 2, 3]).unwrap();
        assert_eq!(upload.mime_type, "image/jpeg");

        let upload = ImageUpload::from_bytes("shelf.png", vec![1]).unwrap();
        assert_eq!(upload.mime_type, "image/png");

        let upload = ImageUpload::from_bytes("a.b.webp", vec![1]).unwrap();
        assert_eq!(upload.mime_type, "image/webp");
    }

    #[test]
    fn test_unsupported_extension() {
        let result = ImageUpload::from_bytes("document.pdf", vec![1]);
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = ImageUpload::from_bytes("no-extension", vec![1]);
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_validate_rejects_empty_payloads() {
        let upload = ImageUpload::new("shelf.jpg", "image/jpeg", Vec::new());
        assert!(matches!(upload.validate(), Err(Error::Validation { .. })));

        let upload = ImageUpload::new("", "image/jpeg", vec![1]);
        assert!(matches!(upload.validate(), Err(Error::Validation { .. })));

        let upload = ImageUpload::new("shelf.jpg", "image/jpeg", vec![1]);
        assert!(upload.validate().is_ok());
    }
}

use std::path::Path;

use image::ImageFormat;

use crate::error::ScanError;

/// Encoded image bytes as delivered by a camera capture or file picker
///
/// The buffer is never modified. The MIME type is only a hint: decoding
/// falls back to content sniffing when it is absent or wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    bytes: Vec<u8>,
    mime: Option<String>,
}

impl RawImage {
    /// Wrap encoded bytes without a declared type
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            mime: None,
        }
    }

    /// Attach a declared MIME type (e.g. `image/jpeg`)
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Read a file, guessing the MIME type from its extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let mime = ImageFormat::from_path(path)
            .ok()
            .map(|format| format.to_mime_type().to_string());
        Ok(Self { bytes, mime })
    }

    /// Encoded bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Declared MIME type, if any
    pub fn mime(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    /// Container format implied by the declared MIME type
    pub fn format_hint(&self) -> Option<ImageFormat> {
        self.mime.as_deref().and_then(ImageFormat::from_mime_type)
    }

    /// Buffer length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the buffer holds no bytes
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

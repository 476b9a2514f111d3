use base64::Engine;
use image::ImageFormat;
use std::path::Path;

/// A document image selected for upload, kept only until a job is created for it.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub file_name: String,
    pub format: ImageFormat,
    pub size: usize,
    /// Standard base64 of the raw bytes, as sent in `image_base64`.
    pub base64: String,
}

impl UploadedImage {
    /// Validate and encode raw image bytes. Only JPEG and PNG are accepted.
    pub fn from_bytes(file_name: impl Into<String>, bytes: &[u8]) -> Result<Self, UploadError> {
        let file_name = file_name.into();
        if bytes.is_empty() {
            return Err(UploadError::Empty(file_name));
        }

        let format = image::guess_format(bytes).map_err(|_| UploadError::Unsupported(file_name.clone()))?;
        if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
            return Err(UploadError::Unsupported(file_name));
        }

        Ok(Self {
            file_name,
            format,
            size: bytes.len(),
            base64: base64::engine::general_purpose::STANDARD.encode(bytes),
        })
    }

    /// Read an image from disk.
    pub async fn open(path: &Path) -> Result<Self, UploadError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(file_name, &bytes)
    }

    /// `data:` URL preview of the image.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.format.to_mime_type(), self.base64)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("{0} is empty")]
    Empty(String),

    #[error("{0} is not a JPEG or PNG image")]
    Unsupported(String),

    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),
}

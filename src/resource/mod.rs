//! Resources accepted by the pipeline and the decoded images they become.
//!
//! A [`Resource`] is one of three kinds, dispatched by exhaustive match in the
//! loader:
//!
//! - `Locator` - a string naming the image (`data:` URL, `http(s)://` URL,
//!   `file://` URL or filesystem path)
//! - `Blob` - raw encoded bytes with a media type
//! - `Handle` - an already-decoded [`ImageHandle`], passed through untouched

pub mod data_url;

use bytes::Bytes;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Result, WatermarkError};

/// An immutable, fully decoded, drawable image.
///
/// Pixels are straight-alpha RGBA8. Cloning shares the pixel buffer.
#[derive(Clone)]
pub struct ImageHandle {
    image: Arc<RgbaImage>,
}

impl std::fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageHandle")
            .field("dimensions", &(self.width(), self.height()))
            .finish()
    }
}

impl ImageHandle {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    /// Decode encoded image bytes.
    ///
    /// The format is sniffed from magic bytes first; `hint` (a media type,
    /// file name or URL) is the fallback.
    pub fn decode(data: &[u8], hint: &str) -> Result<Self> {
        let format = detect_image_format(data, hint)?;
        let image = image::load(Cursor::new(data), format).map_err(WatermarkError::decode)?;
        Ok(Self::new(image.to_rgba8()))
    }

    /// Decode an image carried inside a `data:` URL.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let parts = data_url::split(url).ok_or(WatermarkError::MalformedDataUrl)?;
        let bytes = data_url::decode(parts.payload)?;
        Self::decode(&bytes, parts.media_type)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Whether two handles share the same pixel buffer.
    pub fn ptr_eq(&self, other: &ImageHandle) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }
}

/// Encoded image bytes tagged with their media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    media_type: String,
    bytes: Bytes,
}

impl Blob {
    pub fn new(media_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

/// Anything the pipeline can turn into an [`ImageHandle`].
#[derive(Debug, Clone)]
pub enum Resource {
    Locator(String),
    Blob(Blob),
    Handle(ImageHandle),
}

impl Resource {
    pub fn kind(&self) -> &'static str {
        match self {
            Resource::Locator(_) => "locator",
            Resource::Blob(_) => "blob",
            Resource::Handle(_) => "handle",
        }
    }
}

impl From<&str> for Resource {
    fn from(locator: &str) -> Self {
        Resource::Locator(locator.to_string())
    }
}

impl From<String> for Resource {
    fn from(locator: String) -> Self {
        Resource::Locator(locator)
    }
}

impl From<&Path> for Resource {
    fn from(path: &Path) -> Self {
        Resource::Locator(path.to_string_lossy().into_owned())
    }
}

impl From<Blob> for Resource {
    fn from(blob: Blob) -> Self {
        Resource::Blob(blob)
    }
}

impl From<ImageHandle> for Resource {
    fn from(handle: ImageHandle) -> Self {
        Resource::Handle(handle)
    }
}

/// Detect image format from bytes or a media type / filename extension.
pub(crate) fn detect_image_format(data: &[u8], hint: &str) -> Result<ImageFormat> {
    // Try to detect from magic bytes first
    if let Ok(format) = image::guess_format(data) {
        return Ok(format);
    }

    let hint = hint.to_lowercase();
    let hint = hint.split(['?', '#']).next().unwrap_or_default();

    if let Some(subtype) = hint.strip_prefix("image/") {
        return match subtype {
            "png" => Ok(ImageFormat::Png),
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            "gif" => Ok(ImageFormat::Gif),
            "webp" => Ok(ImageFormat::WebP),
            _ => Err(WatermarkError::decode(format!(
                "Unsupported image format: {}",
                hint
            ))),
        };
    }

    // Fall back to extension
    let ext = hint.rsplit('.').next().unwrap_or_default();

    match ext {
        "png" => Ok(ImageFormat::Png),
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "gif" => Ok(ImageFormat::Gif),
        "webp" => Ok(ImageFormat::WebP),
        _ => Err(WatermarkError::decode(format!(
            "Unsupported image format: {}",
            ext
        ))),
    }
}

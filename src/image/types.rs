//! Core types for image editing.

use crate::error::{Result, SadaamError};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// MIME type assumed when the endpoint omits one on an inline image part.
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Supported output raster formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy, no alpha channel).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Every format the exporter can produce, in menu order.
    pub const ALL: [ImageFormat; 3] = [Self::Png, Self::Jpeg, Self::WebP];

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Whether the format can carry an alpha channel.
    pub fn supports_transparency(&self) -> bool {
        !matches!(self, Self::Jpeg)
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }

    /// Checks if the given data matches this format's magic bytes.
    pub fn matches_bytes(&self, data: &[u8]) -> bool {
        Self::from_magic_bytes(data) == Some(*self)
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// A file the user picked or dropped, before it is encoded.
///
/// `content_type` is whatever the selection surface declared for the file;
/// the encoder trusts it the same way a browser trusts `File.type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// Location of the file on disk.
    pub path: PathBuf,
    /// Declared content type, e.g. `image/jpeg`. May be empty.
    pub content_type: String,
}

impl SelectedFile {
    /// Creates a selection with an explicit content type.
    pub fn new(path: impl Into<PathBuf>, content_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content_type: content_type.into(),
        }
    }

    /// Creates a selection whose content type is guessed from the extension.
    ///
    /// Unknown extensions get `application/octet-stream`.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let content_type = path
            .extension()
            .and_then(|e| e.to_str())
            .map(guess_content_type)
            .unwrap_or("application/octet-stream")
            .to_string();
        Self { path, content_type }
    }

    /// Returns the file name, if the path has one.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

fn guess_content_type(ext: &str) -> &'static str {
    if let Some(format) = ImageFormat::from_extension(ext) {
        return format.mime_type();
    }
    match ext.to_lowercase().as_str() {
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// An encoded input image, ready for display and transport.
///
/// The base64 payload and the data URL are derived from the same bytes when
/// the image is encoded and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputImage {
    source: SelectedFile,
    data_url: String,
    base64: String,
    mime_type: String,
}

impl InputImage {
    /// Encodes raw bytes under the given MIME type.
    pub fn from_bytes(source: SelectedFile, mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        let mime_type = mime_type.into();
        let base64 = base64::engine::general_purpose::STANDARD.encode(bytes);
        let data_url = data_url(&mime_type, &base64);
        Self {
            source,
            data_url,
            base64,
            mime_type,
        }
    }

    /// The file this image was encoded from.
    pub fn source(&self) -> &SelectedFile {
        &self.source
    }

    /// Display-ready `data:` URL.
    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// Base64 payload without the `data:...;base64,` prefix.
    pub fn base64(&self) -> &str {
        &self.base64
    }

    /// MIME type declared for the source file.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Decodes the payload back to the original bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.base64)
            .map_err(|e| SadaamError::Decode(e.to_string()))
    }
}

/// A single edit exchange: one image and one instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    /// Base64 image payload, no scheme prefix.
    pub image_base64: String,
    /// MIME type of the payload.
    pub mime_type: String,
    /// Natural-language instruction.
    pub prompt: String,
}

impl EditRequest {
    /// Creates a request from its parts.
    pub fn new(
        image_base64: impl Into<String>,
        mime_type: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            image_base64: image_base64.into(),
            mime_type: mime_type.into(),
            prompt: prompt.into(),
        }
    }

    /// Builds a request for an encoded input image.
    pub fn for_image(image: &InputImage, prompt: impl Into<String>) -> Self {
        Self::new(image.base64(), image.mime_type(), prompt)
    }
}

/// What the model sent back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditResult {
    /// Generated image as a `data:` URL.
    pub image_url: Option<String>,
    /// Text accompanying (or replacing) the image.
    pub text: Option<String>,
}

impl EditResult {
    /// True when neither an image nor text came back.
    pub fn is_empty(&self) -> bool {
        self.image_url.is_none() && self.text.is_none()
    }
}

/// Builds a `data:` URL from a MIME type and a base64 payload.
pub fn data_url(mime_type: &str, base64: &str) -> String {
    format!("data:{mime_type};base64,{base64}")
}

/// Splits a base64 `data:` URL into its MIME type and decoded bytes.
pub fn parse_data_url(url: &str) -> Result<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| SadaamError::Decode("not a data URL".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| SadaamError::Decode("data URL has no payload".into()))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| SadaamError::Decode("data URL is not base64-encoded".into()))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| SadaamError::Decode(e.to_string()))?;
    Ok((mime_type.to_string(), bytes))
}

/// A decoded result image, held for viewing and export.
#[derive(Debug, Clone)]
#[must_use = "result image should be exported or displayed"]
pub struct ResultImage {
    source: String,
    mime_type: String,
    pixels: image::DynamicImage,
}

impl ResultImage {
    /// Decodes the image carried by a `data:` URL.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let (mime_type, bytes) = parse_data_url(url)?;
        let pixels = image::load_from_memory(&bytes)?;
        Ok(Self {
            source: url.to_string(),
            mime_type,
            pixels,
        })
    }

    /// The `data:` URL this image was decoded from. Used as the display source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// MIME type reported by the model.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Natural width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Natural height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Decoded pixels.
    pub fn pixels(&self) -> &image::DynamicImage {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&WEBP_MAGIC),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"short"), None);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ImageFormat::from_extension("PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("webp"), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_extension("gif"), None);
    }

    #[test]
    fn test_transparency_support() {
        assert!(ImageFormat::Png.supports_transparency());
        assert!(ImageFormat::WebP.supports_transparency());
        assert!(!ImageFormat::Jpeg.supports_transparency());
    }

    #[test]
    fn test_selected_file_guesses_content_type() {
        assert_eq!(SelectedFile::from_path("a/b.JPG").content_type, "image/jpeg");
        assert_eq!(SelectedFile::from_path("a/b.gif").content_type, "image/gif");
        assert_eq!(SelectedFile::from_path("notes.txt").content_type, "text/plain");
        assert_eq!(
            SelectedFile::from_path("no_extension").content_type,
            "application/octet-stream"
        );
    }

    #[test]
    fn test_input_image_derives_url_and_payload_together() {
        let image = InputImage::from_bytes(SelectedFile::from_path("x.png"), "image/png", b"abc");
        assert_eq!(image.base64(), "YWJj");
        assert_eq!(image.data_url(), "data:image/png;base64,YWJj");
        assert_eq!(image.decode().unwrap(), b"abc");
    }

    #[test]
    fn test_parse_data_url() {
        let (mime, bytes) = parse_data_url("data:image/jpeg;base64,YWJj").unwrap();
        assert_eq!(mime, "image/jpeg");
        assert_eq!(bytes, b"abc");

        assert!(parse_data_url("http://example.com/a.png").is_err());
        assert!(parse_data_url("data:image/png,plain").is_err());
        assert!(parse_data_url("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn test_edit_result_is_empty() {
        assert!(EditResult::default().is_empty());
        assert!(!EditResult {
            image_url: None,
            text: Some("hi".into()),
        }
        .is_empty());
    }
}

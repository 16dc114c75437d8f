//! Turns a selected file into an [`InputImage`].

use crate::error::{Result, SadaamError};
use crate::image::types::{InputImage, SelectedFile};

/// Content types accepted by [`encode`] start with this prefix.
const IMAGE_CONTENT_PREFIX: &str = "image/";

/// Checks the declared content type without touching the file.
pub fn validate(file: &SelectedFile) -> Result<()> {
    if file.content_type.starts_with(IMAGE_CONTENT_PREFIX) {
        Ok(())
    } else {
        Err(SadaamError::Validation {
            content_type: file.content_type.clone(),
        })
    }
}

/// Reads and encodes a selected image file.
///
/// Non-image content types are rejected before any read happens. Read
/// failures surface as [`SadaamError::Io`].
pub async fn encode(file: &SelectedFile) -> Result<InputImage> {
    validate(file)?;

    let bytes = tokio::fs::read(&file.path).await?;
    tracing::debug!(
        path = %file.path.display(),
        mime_type = %file.content_type,
        bytes = bytes.len(),
        "encoded input image"
    );

    Ok(InputImage::from_bytes(
        file.clone(),
        file.content_type.clone(),
        &bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PNG_BYTES: [u8; 16] = [
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D, b'I', b'H', b'D', b'R',
    ];

    fn write_temp(bytes: &[u8], suffix: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[tokio::test]
    async fn test_encode_round_trips_bytes() {
        let tmp = write_temp(&PNG_BYTES, ".png");
        let selected = SelectedFile::from_path(tmp.path());

        let image = encode(&selected).await.unwrap();
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.decode().unwrap(), PNG_BYTES);
        assert!(image.data_url().starts_with("data:image/png;base64,"));
        assert!(image.data_url().ends_with(image.base64()));
    }

    #[tokio::test]
    async fn test_encode_round_trips_arbitrary_bytes() {
        // Lengths that exercise every base64 padding case.
        for len in [0usize, 1, 2, 3, 255, 1024] {
            let bytes: Vec<u8> = (0..len).map(|i| (i * 31 % 256) as u8).collect();
            let tmp = write_temp(&bytes, ".bin");
            let selected = SelectedFile::new(tmp.path(), "image/webp");

            let image = encode(&selected).await.unwrap();
            assert_eq!(image.decode().unwrap(), bytes, "len {len}");
        }
    }

    #[tokio::test]
    async fn test_encode_rejects_non_image_without_reading() {
        let selected = SelectedFile::new("/definitely/not/here.txt", "text/plain");

        let err = encode(&selected).await.unwrap_err();
        assert!(matches!(err, SadaamError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_encode_rejects_empty_content_type() {
        let tmp = write_temp(&PNG_BYTES, ".png");
        let selected = SelectedFile::new(tmp.path(), "");

        assert!(matches!(
            encode(&selected).await,
            Err(SadaamError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_encode_surfaces_read_failure() {
        let selected = SelectedFile::new("/definitely/not/here.png", "image/png");

        let err = encode(&selected).await.unwrap_err();
        assert!(matches!(err, SadaamError::Io(_)));
    }
}

//! Re-encoding a result image for download.

use crate::error::Result;
use crate::image::{ImageFormat, ResultImage};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use std::path::{Path, PathBuf};

/// File name stem of every export.
pub const EXPORT_FILE_STEM: &str = "sadaam-edit";

/// Quality used for lossy formats.
pub const LOSSY_QUALITY: u8 = 90;

const OPAQUE_WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// An encoded export, ready to be written out.
#[derive(Debug, Clone)]
#[must_use = "exported image should be saved or offered for download"]
pub struct ExportedImage {
    /// Encoded bytes.
    pub data: Vec<u8>,
    /// Output format.
    pub format: ImageFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ExportedImage {
    /// Suggested file name, e.g. `sadaam-edit.jpg`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", EXPORT_FILE_STEM, self.format.extension())
    }

    /// Writes the export into `dir` under [`file_name`](Self::file_name).
    pub fn save_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(self.file_name());
        std::fs::write(&path, &self.data)?;
        Ok(path)
    }

    /// Returns the export as a data URL.
    pub fn to_data_url(&self) -> String {
        use base64::Engine;
        crate::image::data_url(
            self.format.mime_type(),
            &base64::engine::general_purpose::STANDARD.encode(&self.data),
        )
    }
}

/// Re-encodes the displayed result image into `format`.
///
/// The image is drawn at its natural size onto a fresh canvas. Formats
/// without an alpha channel get an opaque white canvas first, so transparent
/// pixels come out white rather than black.
pub fn export(image: &ResultImage, format: ImageFormat) -> Result<ExportedImage> {
    let (width, height) = (image.width(), image.height());
    let source = image.pixels().to_rgba8();

    let canvas = if format.supports_transparency() {
        source
    } else {
        let mut canvas = RgbaImage::from_pixel(width, height, OPAQUE_WHITE);
        image::imageops::overlay(&mut canvas, &source, 0, 0);
        canvas
    };

    let mut data = Vec::new();
    match format {
        ImageFormat::Png => PngEncoder::new(&mut data).write_image(
            canvas.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        )?,
        ImageFormat::Jpeg => {
            let rgb = image::DynamicImage::ImageRgba8(canvas).to_rgb8();
            JpegEncoder::new_with_quality(&mut data, LOSSY_QUALITY).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )?
        }
        // The image crate only writes lossless WebP.
        ImageFormat::WebP => WebPEncoder::new_lossless(&mut data).write_image(
            canvas.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        )?,
    }

    tracing::debug!(
        format = %format,
        width,
        height,
        bytes = data.len(),
        "exported result image"
    );

    Ok(ExportedImage {
        data,
        format,
        width,
        height,
    })
}

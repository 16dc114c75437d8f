//! Image editing module.

pub mod encoder;
mod provider;
pub mod providers;
mod types;

pub use provider::ImageEditor;
pub use types::{
    data_url, parse_data_url, EditRequest, EditResult, ImageFormat, InputImage, ResultImage,
    SelectedFile, DEFAULT_IMAGE_MIME,
};

//! Image editor trait.

use crate::error::Result;
use crate::image::types::{EditRequest, EditResult};
use async_trait::async_trait;

/// A model endpoint that edits an image according to an instruction.
///
/// One call is one request/response exchange. Implementations never retry;
/// recovery is up to the caller.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    /// Sends the image and instruction, returning whatever image and text came back.
    ///
    /// An empty [`EditResult`] is a valid return value here; deciding that it
    /// counts as a failure is left to the session.
    async fn edit(&self, request: &EditRequest) -> Result<EditResult>;

    /// Returns the model identifier used for display.
    fn model_name(&self) -> &str;
}


#![warn(missing_docs)]
//! Sadaam - edit images with a natural-language instruction.
//!
//! The crate wraps one request/response exchange with a hosted multimodal
//! model, plus the client-side pieces around it: encoding a picked file,
//! the edit session state machine, a pan/zoom viewer, and re-encoding the
//! result for download.
//!
//! # Quick Start
//!
//! ```no_run
//! use sadaam::{encoder, GeminiEditor, SelectedFile, Session, SessionPhase};
//!
//! #[tokio::main]
//! async fn main() -> sadaam::Result<()> {
//!     let editor = GeminiEditor::builder().build()?;
//!     let image = encoder::encode(&SelectedFile::from_path("portrait.png")).await?;
//!
//!     let mut session = Session::new();
//!     session.set_input_image(image)?;
//!     session.set_prompt("Add sunglasses")?;
//!
//!     if session.edit(&editor).await? == SessionPhase::Success {
//!         println!("{:?}", session.result());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `gemini`: Gemini `generateContent` client (default)
//! - `cli`: Command-line interface (default)

mod error;
pub mod export;
pub mod image;
pub mod session;
pub mod viewer;

// Re-export error types at crate root
pub use error::{ErrorKind, Result, SadaamError, EMPTY_RESULT_MESSAGE};

pub use export::{export, ExportedImage};
pub use crate::image::{
    encoder, EditRequest, EditResult, ImageEditor, ImageFormat, InputImage, ResultImage,
    SelectedFile,
};
pub use session::{EditTicket, QuickAction, Session, SessionPhase, Suggestion, SUGGESTIONS};
pub use viewer::{Viewer, ViewerTransform};

#[cfg(feature = "gemini")]
pub use crate::image::providers::{GeminiEditor, GeminiEditorBuilder, GeminiModel};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, SadaamError};
    pub use crate::image::{EditResult, ImageEditor, ImageFormat, SelectedFile};
    pub use crate::session::{Session, SessionPhase};

    #[cfg(feature = "gemini")]
    pub use crate::image::providers::GeminiEditor;
}

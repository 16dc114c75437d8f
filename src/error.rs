//! Error types for image editing.

use std::time::Duration;

/// Message stored when the model answers without an image or text part.
pub const EMPTY_RESULT_MESSAGE: &str =
    "The model didn't return an image or text. Try a different prompt.";

/// Errors that can occur while encoding, editing or exporting an image.
#[derive(Debug, thiserror::Error)]
pub enum SadaamError {
    /// The selected file is not an image.
    #[error("please upload an image file (got {content_type:?})")]
    Validation {
        /// Declared content type of the rejected file.
        content_type: String,
    },

    /// No API key configured for the model endpoint.
    #[error("API key is missing: set GEMINI_API_KEY, GOOGLE_API_KEY or API_KEY")]
    MissingCredential,

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Server-suggested delay, if any.
        retry_after: Option<Duration>,
    },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data or a data URL.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (reading the input, writing an export).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raster decode or re-encode failure.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The exchange succeeded but produced neither image nor text.
    #[error("{}", EMPTY_RESULT_MESSAGE)]
    EmptyResult,

    /// Invalid request (no input image, blank prompt).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An edit is already in flight.
    #[error("an edit is already in progress")]
    Busy,
}

/// Coarse classification of [`SadaamError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Non-image file rejected by the encoder.
    Validation,
    /// No credential configured.
    MissingCredential,
    /// Network, protocol or endpoint failure during the model exchange.
    TransportFailure,
    /// The exchange produced no output.
    EmptyResult,
    /// Caller misuse: blank prompt, no input, concurrent edit.
    Usage,
    /// Local I/O or re-encoding failure outside the model exchange.
    Local,
}

impl SadaamError {
    /// Returns the taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::MissingCredential => ErrorKind::MissingCredential,
            Self::Api { .. }
            | Self::RateLimited { .. }
            | Self::ContentBlocked(_)
            | Self::Network(_)
            | Self::Json(_) => ErrorKind::TransportFailure,
            // Undecodable payloads only come back from the endpoint.
            Self::Decode(_) => ErrorKind::TransportFailure,
            Self::EmptyResult => ErrorKind::EmptyResult,
            Self::InvalidRequest(_) | Self::Busy => ErrorKind::Usage,
            Self::Io(_) | Self::Image(_) => ErrorKind::Local,
        }
    }
}

/// Result type alias for image editing operations.
pub type Result<T> = std::result::Result<T, SadaamError>;

/// Maximum length of an endpoint error body carried in an error message.
const MAX_ERROR_BODY: usize = 500;

/// Trims an endpoint error body down to something fit for display.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= MAX_ERROR_BODY {
        return text.to_string();
    }
    let truncated: String = text.chars().take(MAX_ERROR_BODY).collect();
    format!("{truncated}...")
}

/// Reads a `Retry-After` header given in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            SadaamError::Validation {
                content_type: "text/plain".into()
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            SadaamError::MissingCredential.kind(),
            ErrorKind::MissingCredential
        );
        assert_eq!(
            SadaamError::Api {
                status: 500,
                message: "boom".into()
            }
            .kind(),
            ErrorKind::TransportFailure
        );
        assert_eq!(
            SadaamError::ContentBlocked("nsfw".into()).kind(),
            ErrorKind::TransportFailure
        );
        assert_eq!(SadaamError::EmptyResult.kind(), ErrorKind::EmptyResult);
        assert_eq!(SadaamError::Busy.kind(), ErrorKind::Usage);
    }

    #[test]
    fn test_error_display() {
        let err = SadaamError::Api {
            status: 404,
            message: "Not found".into(),
        };
        assert_eq!(err.to_string(), "API error: 404 - Not found");

        assert_eq!(SadaamError::EmptyResult.to_string(), EMPTY_RESULT_MESSAGE);
        assert!(SadaamError::MissingCredential
            .to_string()
            .contains("API key is missing"));
    }

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let long = "x".repeat(2000);
        let clean = sanitize_error_message(&long);
        assert_eq!(clean.chars().count(), MAX_ERROR_BODY + 3);
        assert!(clean.ends_with("..."));

        assert_eq!(sanitize_error_message("  short \n"), "short");
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(reqwest::header::RETRY_AFTER, "30".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(30));

        headers.insert(reqwest::header::RETRY_AFTER, "soon".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), None);
    }
}

//! Gemini (Google) image editing client.

use crate::error::{parse_retry_after, sanitize_error_message, Result, SadaamError};
use crate::image::provider::ImageEditor;
use crate::image::types::{data_url, EditRequest, EditResult, DEFAULT_IMAGE_MIME};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 3] = ["GEMINI_API_KEY", "GOOGLE_API_KEY", "API_KEY"];

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    #[default]
    NanoBanana,
    /// Nano Banana Pro - Gemini 3 Pro Image (highest quality).
    NanoBananaPro,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NanoBanana => "gemini-2.5-flash-image",
            Self::NanoBananaPro => "nano-banana-pro-preview",
        }
    }
}

impl std::fmt::Display for GeminiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder for [`GeminiEditor`].
#[derive(Debug, Clone)]
pub struct GeminiEditorBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    base_url: String,
    read_env: bool,
}

impl Default for GeminiEditorBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            model: GeminiModel::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            read_env: true,
        }
    }
}

impl GeminiEditorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to [`API_KEY_ENV_VARS`].
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the endpoint root, e.g. for a local mock server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Skips the environment fallback for the API key.
    pub fn ignore_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    /// Builds the client.
    ///
    /// A missing API key is not an error here; every [`ImageEditor::edit`]
    /// call fails with [`SadaamError::MissingCredential`] instead.
    pub fn build(self) -> Result<GeminiEditor> {
        let read_env = self.read_env;
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| read_env.then(api_key_from_env).flatten());

        if api_key.is_none() {
            tracing::warn!("no Gemini API key configured; edits will fail");
        }

        Ok(GeminiEditor {
            client: reqwest::Client::builder().build()?,
            api_key,
            model: self.model,
            base_url: self.base_url,
        })
    }
}

fn api_key_from_env() -> Option<String> {
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|key| !key.trim().is_empty())
}

/// Gemini image editing client.
pub struct GeminiEditor {
    client: reqwest::Client,
    api_key: Option<String>,
    model: GeminiModel,
    base_url: String,
}

impl GeminiEditor {
    /// Creates a new `GeminiEditorBuilder`.
    pub fn builder() -> GeminiEditorBuilder {
        GeminiEditorBuilder::new()
    }

    /// Whether an API key is configured.
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn edit_impl(&self, request: &EditRequest) -> Result<EditResult> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SadaamError::MissingCredential)?;

        let start = Instant::now();

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            self.model.as_str(),
        );

        let body = GeminiRequest::from_edit_request(request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let result = gemini_response.into_edit_result()?;

        tracing::debug!(
            model = self.model.as_str(),
            has_image = result.image_url.is_some(),
            has_text = result.text.is_some(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Gemini edit complete"
        );

        Ok(result)
    }
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> SadaamError {
    let text = sanitize_error_message(text);
    if status == 404 {
        return SadaamError::Api {
            status,
            message: "Model not found. Verify the model name is correct.".into(),
        };
    }
    if status == 429 {
        let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
        return SadaamError::RateLimited { retry_after };
    }
    let lower = text.to_lowercase();
    if lower.contains("safety") || lower.contains("blocked") || lower.contains("prohibited") {
        return SadaamError::ContentBlocked(text);
    }
    SadaamError::Api {
        status,
        message: text,
    }
}

#[async_trait]
impl ImageEditor for GeminiEditor {
    async fn edit(&self, request: &EditRequest) -> Result<EditResult> {
        self.edit_impl(request).await
    }

    fn model_name(&self) -> &str {
        self.model.as_str()
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn from_edit_request(req: &EditRequest) -> Self {
        let parts = vec![
            GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: req.mime_type.clone(),
                    data: req.image_base64.clone(),
                },
            },
            GeminiRequestPart::Text {
                text: req.prompt.clone(),
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    inline_data: Option<InlineData>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    data: String,
}

impl GeminiResponse {
    /// Extracts the image and text from the first candidate.
    ///
    /// When several parts of the same kind are present, the last one wins.
    fn into_edit_result(self) -> Result<EditResult> {
        // Blocks arrive as HTTP 200 with prompt_feedback set
        if let Some(feedback) = self.prompt_feedback {
            if let Some(reason) = feedback.block_reason {
                let msg = feedback
                    .block_reason_message
                    .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
                return Err(SadaamError::ContentBlocked(msg));
            }
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Ok(EditResult::default());
        };

        if let Some(ref finish_reason) = candidate.finish_reason {
            if matches!(
                finish_reason.as_str(),
                "SAFETY"
                    | "IMAGE_SAFETY"
                    | "IMAGE_PROHIBITED_CONTENT"
                    | "PROHIBITED_CONTENT"
                    | "BLOCKLIST"
            ) {
                return Err(SadaamError::ContentBlocked(format!(
                    "Content blocked by Gemini safety filter: {}",
                    finish_reason
                )));
            }
        }

        let mut result = EditResult::default();
        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
        for part in parts {
            if let Some(inline) = part.inline_data {
                let mime = inline
                    .mime_type
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
                result.image_url = Some(data_url(&mime, &inline.data));
            } else if let Some(text) = part.text.filter(|t| !t.is_empty()) {
                result.text = Some(text);
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    const EDIT_PATH: &str = "/v1beta/models/gemini-2.5-flash-image:generateContent";

    fn request() -> EditRequest {
        EditRequest::new("iVBORw0KGgo=", "image/png", "Add sunglasses")
    }

    fn parse(json: serde_json::Value) -> Result<EditResult> {
        let resp: GeminiResponse = serde_json::from_value(json).unwrap();
        resp.into_edit_result()
    }

    #[test]
    fn test_gemini_model_as_str() {
        assert_eq!(GeminiModel::NanoBanana.as_str(), "gemini-2.5-flash-image");
        assert_eq!(
            GeminiModel::NanoBananaPro.as_str(),
            "nano-banana-pro-preview"
        );
        assert_eq!(GeminiModel::default(), GeminiModel::NanoBanana);
    }

    #[test]
    fn test_builder_blank_key_counts_as_missing() {
        let editor = GeminiEditorBuilder::new()
            .api_key("   ")
            .ignore_env()
            .build()
            .unwrap();
        assert!(!editor.has_credential());

        let editor = GeminiEditorBuilder::new()
            .api_key("test-key")
            .build()
            .unwrap();
        assert!(editor.has_credential());
    }

    #[test]
    fn test_request_serialization() {
        let body = GeminiRequest::from_edit_request(&request());
        let json = serde_json::to_value(&body).unwrap();

        let parts = json["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "iVBORw0KGgo=");
        assert_eq!(parts[1]["text"], "Add sunglasses");
        assert!(json.get("generationConfig").is_some());
        assert!(json.get("generation_config").is_none());
    }

    #[test]
    fn test_response_image_only() {
        let result = parse(json!({
            "candidates": [{
                "content": {"parts": [{"inlineData": {"mimeType": "image/jpeg", "data": "/9j/"}}]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(result.image_url.as_deref(), Some("data:image/jpeg;base64,/9j/"));
        assert!(result.text.is_none());
    }

    #[test]
    fn test_response_missing_mime_defaults_to_png() {
        let result = parse(json!({
            "candidates": [{"content": {"parts": [{"inlineData": {"data": "AAAA"}}]}}]
        }))
        .unwrap();
        assert_eq!(result.image_url.as_deref(), Some("data:image/png;base64,AAAA"));
    }

    #[test]
    fn test_response_last_part_of_each_kind_wins() {
        let result = parse(json!({
            "candidates": [{"content": {"parts": [
                {"text": "first"},
                {"inlineData": {"mimeType": "image/png", "data": "AAAA"}},
                {"text": "second"},
                {"inlineData": {"mimeType": "image/webp", "data": "BBBB"}}
            ]}}]
        }))
        .unwrap();
        assert_eq!(result.image_url.as_deref(), Some("data:image/webp;base64,BBBB"));
        assert_eq!(result.text.as_deref(), Some("second"));
    }

    #[test]
    fn test_response_without_parts_is_empty() {
        assert!(parse(json!({"candidates": []})).unwrap().is_empty());
        assert!(parse(json!({"candidates": [{"content": {"parts": [{}]}}]}))
            .unwrap()
            .is_empty());
        assert!(parse(json!({"candidates": [{"finishReason": "STOP"}]}))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_response_prompt_feedback_block() {
        let err = parse(json!({
            "candidates": [],
            "promptFeedback": {
                "blockReason": "SAFETY",
                "blockReasonMessage": "Prompt was blocked due to safety"
            }
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "content blocked: Prompt was blocked due to safety");
    }

    #[test]
    fn test_response_safety_finish_reason() {
        let err = parse(json!({"candidates": [{"finishReason": "IMAGE_SAFETY"}]})).unwrap_err();
        assert!(matches!(err, SadaamError::ContentBlocked(_)));
    }

    #[test]
    fn test_parse_error_statuses() {
        let headers = reqwest::header::HeaderMap::new();
        assert!(matches!(
            parse_error(429, "", &headers),
            SadaamError::RateLimited { retry_after: None }
        ));
        assert!(matches!(
            parse_error(400, "request blocked by safety settings", &headers),
            SadaamError::ContentBlocked(_)
        ));
        match parse_error(500, "internal", &headers) {
            SadaamError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "internal");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_edit_against_mock_server() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", EDIT_PATH)
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(json!({
                "contents": [{"parts": [
                    {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}},
                    {"text": "Add sunglasses"}
                ]}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "candidates": [{"content": {"parts": [
                        {"text": "Here you go"},
                        {"inlineData": {"mimeType": "image/jpeg", "data": "/9j/"}}
                    ]}}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let editor = GeminiEditor::builder()
            .api_key("test-key")
            .base_url(server.url())
            .build()
            .unwrap();

        let result = editor.edit(&request()).await.unwrap();
        assert_eq!(result.image_url.as_deref(), Some("data:image/jpeg;base64,/9j/"));
        assert_eq!(result.text.as_deref(), Some("Here you go"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_edit_without_credential_makes_no_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let editor = GeminiEditor::builder()
            .ignore_env()
            .base_url(server.url())
            .build()
            .unwrap();

        let err = editor.edit(&request()).await.unwrap_err();
        assert!(matches!(err, SadaamError::MissingCredential));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_edit_endpoint_error_is_transport_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", EDIT_PATH)
            .with_status(503)
            .with_body("backend unavailable")
            .create_async()
            .await;

        let editor = GeminiEditor::builder()
            .api_key("test-key")
            .base_url(server.url())
            .build()
            .unwrap();

        let err = editor.edit(&request()).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::TransportFailure);
        assert_eq!(err.to_string(), "API error: 503 - backend unavailable");
    }
}

//! Gemini-backed implementation of the image service.
//!
//! Generation goes through the Imagen `:predict` endpoint; edits go through
//! `generateContent` with the source image attached as inline data.

use crate::error::{Result, StudioError};
use crate::service::ImageService;
use crate::types::{AspectRatio, ImageFormat};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Model used for text-to-image generation.
const GENERATE_MODEL: &str = "imagen-4.0-generate-001";

/// Model used for image editing.
const EDIT_MODEL: &str = "gemini-2.5-flash-image";

/// Per-request timeout. Imagen calls routinely take tens of seconds.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Builder for [`GeminiService`].
#[derive(Debug, Clone, Default)]
pub struct GeminiServiceBuilder {
    api_key: Option<String>,
}

impl GeminiServiceBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to the `GEMINI_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Builds the service, resolving the API key.
    pub fn build(self) -> Result<GeminiService> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| {
                StudioError::Auth("GEMINI_API_KEY not set and no API key provided".into())
            })?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(GeminiService { client, api_key })
    }
}

/// Client for the Gemini image APIs.
pub struct GeminiService {
    client: reqwest::Client,
    api_key: String,
}

impl GeminiService {
    /// Creates a new `GeminiServiceBuilder`.
    pub fn builder() -> GeminiServiceBuilder {
        GeminiServiceBuilder::new()
    }

    async fn generate_impl(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<String> {
        let url = format!("{API_BASE}/{GENERATE_MODEL}:predict");
        let body = PredictRequest::new(prompt, aspect_ratio);

        tracing::debug!(model = GENERATE_MODEL, %aspect_ratio, "generating image");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text));
        }

        let predict_response: PredictResponse = response.json().await?;

        predict_response
            .predictions
            .into_iter()
            .find_map(|p| p.bytes_base64_encoded)
            .ok_or_else(|| {
                StudioError::UnexpectedResponse("No image data in Imagen response".into())
            })
    }

    async fn edit_impl(
        &self,
        prompt: &str,
        source_base64: &str,
        format: ImageFormat,
    ) -> Result<String> {
        let url = format!("{API_BASE}/{EDIT_MODEL}:generateContent");
        let body = GenerateContentRequest::edit(prompt, source_base64, format);

        tracing::debug!(model = EDIT_MODEL, format = format.mime_type(), "editing image");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text));
        }

        let content_response: GenerateContentResponse = response.json().await?;

        // Blocked prompts come back as HTTP 200 with prompt feedback
        if let Some(ref feedback) = content_response.prompt_feedback {
            if let Some(ref reason) = feedback.block_reason {
                let msg = feedback
                    .block_reason_message
                    .clone()
                    .unwrap_or_else(|| format!("Prompt blocked: {reason}"));
                return Err(StudioError::ContentBlocked(msg));
            }
        }

        let candidate = content_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| {
                StudioError::UnexpectedResponse("No candidates in Gemini response".into())
            })?;

        if let Some(ref finish_reason) = candidate.finish_reason {
            match finish_reason.as_str() {
                "SAFETY"
                | "IMAGE_SAFETY"
                | "IMAGE_PROHIBITED_CONTENT"
                | "IMAGE_RECITATION"
                | "RECITATION"
                | "PROHIBITED_CONTENT"
                | "BLOCKLIST" => {
                    return Err(StudioError::ContentBlocked(format!(
                        "Content blocked by Gemini safety filter: {finish_reason}"
                    )));
                }
                "IMAGE_OTHER" | "NO_IMAGE" => {
                    return Err(StudioError::UnexpectedResponse(format!(
                        "Edit failed: {finish_reason}. Try a different prompt."
                    )));
                }
                _ => {} // STOP, MAX_TOKENS, etc. are normal
            }
        }

        let content = candidate.content.ok_or_else(|| {
            StudioError::UnexpectedResponse("No content in Gemini candidate".into())
        })?;

        content
            .parts
            .into_iter()
            .find_map(|p| p.inline_data)
            .map(|inline| inline.data)
            .ok_or_else(|| {
                StudioError::UnexpectedResponse("No image data in Gemini response".into())
            })
    }
}

#[async_trait]
impl ImageService for GeminiService {
    async fn generate(&self, prompt: &str, aspect_ratio: AspectRatio) -> Result<String> {
        self.generate_impl(prompt, aspect_ratio).await
    }

    async fn edit(&self, prompt: &str, source_base64: &str, format: ImageFormat) -> Result<String> {
        self.edit_impl(prompt, source_base64, format).await
    }

    async fn health_check(&self) -> Result<()> {
        let url = format!("{API_BASE}/{EDIT_MODEL}");

        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Err(StudioError::Auth("Invalid API key".into())),
            404 => Err(StudioError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            )),
            s if !(200..300).contains(&s) => Err(StudioError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

/// Maps a non-success HTTP response to a typed error.
fn parse_error(status: u16, text: &str) -> StudioError {
    let message = extract_error_message(text);

    if status == 401 || status == 403 {
        return StudioError::Auth(message);
    }
    if status == 429 {
        return StudioError::RateLimited(message);
    }
    if status == 404 {
        return StudioError::InvalidRequest(
            "Model not found. Verify the model name is correct.".into(),
        );
    }

    let lower = message.to_lowercase();
    if lower.contains("safety")
        || lower.contains("blocked")
        || lower.contains("content_policy")
        || lower.contains("prohibited")
    {
        return StudioError::ContentBlocked(message);
    }

    StudioError::Api { status, message }
}

/// Pulls the human-readable message out of an API error body.
///
/// Error bodies are usually `{"error": {"message": "...", ...}}`; anything
/// else is returned trimmed as-is.
fn extract_error_message(text: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    match serde_json::from_str::<ErrorBody>(text) {
        Ok(body) if !body.error.message.trim().is_empty() => body.error.message,
        _ => text.trim().to_string(),
    }
}

// Request/Response types - Imagen predict

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    number_of_images: u32,
    aspect_ratio: AspectRatio,
    output_mime_type: &'static str,
}

impl PredictRequest {
    fn new(prompt: &str, aspect_ratio: AspectRatio) -> Self {
        Self {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                number_of_images: 1,
                aspect_ratio,
                output_mime_type: ImageFormat::Jpeg.mime_type(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
}

// Request/Response types - generateContent

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

/// A part in a request - either text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    InlineData {
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

impl GenerateContentRequest {
    fn edit(prompt: &str, source_base64: &str, format: ImageFormat) -> Self {
        // Source image first, then the instruction
        let parts = vec![
            RequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: format.mime_type().to_string(),
                    data: source_base64.to_string(),
                },
            },
            RequestPart::Text {
                text: prompt.to_string(),
            },
        ];

        Self {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
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
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

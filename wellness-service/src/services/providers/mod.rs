//! AI provider abstractions and implementations.
//!
//! Text generation (Gemini) and image annotation (Cloud Vision) sit behind
//! traits so the proxy layer can run against mocks.

pub mod gemini;
pub mod mock;
pub mod vision;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use service_core::observability::inject_trace_context;
use thiserror::Error;

/// Google APIs read the key from this header. It never goes in a URL.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Short label used in metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError(_) => "api_error",
            ProviderError::InvalidRequest(_) => "invalid_request",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::ContentFiltered => "content_filtered",
            ProviderError::NetworkError(_) => "network_error",
        }
    }
}

/// Outbound headers for a Google API call: the key plus the trace context.
pub(crate) fn google_headers(api_key: &str) -> Result<HeaderMap, ProviderError> {
    let mut headers = HeaderMap::new();
    let mut key = HeaderValue::from_str(api_key)
        .map_err(|_| ProviderError::NotConfigured("API key is not a valid header value".to_string()))?;
    key.set_sensitive(true);
    headers.insert(API_KEY_HEADER, key);
    inject_trace_context(&mut headers);
    Ok(headers)
}

/// Transport failure, stripped of the request URL.
pub(crate) fn network_error(e: reqwest::Error) -> ProviderError {
    ProviderError::NetworkError(e.without_url().to_string())
}

/// Result of a text generation call.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: Option<String>,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub finish_reason: FinishReason,
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    /// Cut off at `max_tokens`; JSON output is likely incomplete.
    Length,
    ContentFilter,
}

/// Speaker of a prior conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// Generation parameters for AI requests.
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    /// Temperature (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Maximum output tokens.
    pub max_tokens: Option<i32>,

    /// Ask the model for `application/json` output.
    pub json_output: bool,

    /// System instruction prepended to the conversation.
    pub system_instruction: Option<String>,
}

/// Trait for text/JSON generation providers (e.g., Gemini).
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate a response to `prompt`, preceded by `history`.
    async fn generate(
        &self,
        prompt: &str,
        history: &[ChatTurn],
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Label {
    pub description: String,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocalizedObject {
    pub name: String,
    pub score: f32,
    /// Normalised (0..1) bounding polygon.
    pub vertices: Vec<Vertex>,
}

/// Head orientation of a detected face, in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FaceGeometry {
    pub roll_angle: f32,
    pub pan_angle: f32,
    pub tilt_angle: f32,
    pub detection_confidence: f32,
}

/// What the vision API saw in an image.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageAnnotations {
    pub labels: Vec<Label>,
    pub objects: Vec<LocalizedObject>,
    pub faces: Vec<FaceGeometry>,
}

impl ImageAnnotations {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.objects.is_empty() && self.faces.is_empty()
    }
}

/// Trait for image annotation providers (e.g., Cloud Vision).
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Annotate a base64-encoded image (no `data:` prefix).
    async fn annotate(&self, image_base64: &str) -> Result<ImageAnnotations, ProviderError>;
}

//! The AI proxy: one request in, one (or, for posture, two) provider calls
//! out, and a canned payload whenever anything upstream fails.

use crate::dtos::{
    ChatReply, FitnessPlanRequest, PostureAnalysisRequest, PostureReport, TherapistChatRequest,
};
use crate::services::providers::{
    FinishReason, GenerationParams, ImageAnnotations, ProviderError, ProviderResponse, TextProvider,
    VisionProvider,
};
use crate::services::{fallback, metrics, posture, prompts};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Proxy result: `fallback` is true when `data` is the canned payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyOutcome<T> {
    pub data: T,
    pub fallback: bool,
}

impl<T> ProxyOutcome<T> {
    fn live(data: T) -> Self {
        Self {
            data,
            fallback: false,
        }
    }

    fn canned(route: &'static str, data: T) -> Self {
        metrics::record_fallback(route);
        Self {
            data,
            fallback: true,
        }
    }
}

/// Why a model answer could not be used.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Model returned no text")]
    EmptyResponse,

    #[error("Model returned unparseable JSON: {0}")]
    InvalidJson(String),
}

#[derive(Clone)]
pub struct WellnessAssistant {
    text: Arc<dyn TextProvider>,
    vision: Arc<dyn VisionProvider>,
}

impl WellnessAssistant {
    pub fn new(text: Arc<dyn TextProvider>, vision: Arc<dyn VisionProvider>) -> Self {
        Self { text, vision }
    }

    pub async fn health_check(&self) -> Result<(), ProviderError> {
        self.text.health_check().await
    }

    pub async fn fitness_plan(&self, request: &FitnessPlanRequest) -> ProxyOutcome<Value> {
        let prompt = prompts::fitness_plan_prompt(request);
        let params = GenerationParams {
            temperature: Some(0.7),
            max_tokens: Some(4096),
            json_output: true,
            system_instruction: Some(prompts::COACH_SYSTEM_INSTRUCTION.to_string()),
        };

        let result = self
            .generate_text(&prompt, &[], &params)
            .await
            .and_then(|text| parse_model_json::<Value>(&text))
            .and_then(|plan| {
                if plan.is_object() {
                    Ok(plan)
                } else {
                    Err(AssistantError::InvalidJson("expected a JSON object".to_string()))
                }
            });

        match result {
            Ok(plan) => ProxyOutcome::live(plan),
            Err(e) => {
                tracing::warn!(error = %e, "Fitness plan generation failed, serving demo plan");
                ProxyOutcome::canned("fitness_plan", fallback::demo_fitness_plan(request))
            }
        }
    }

    pub async fn therapist_chat(&self, request: &TherapistChatRequest) -> ProxyOutcome<ChatReply> {
        let params = GenerationParams {
            temperature: Some(0.8),
            max_tokens: Some(512),
            json_output: false,
            system_instruction: Some(prompts::THERAPIST_SYSTEM_INSTRUCTION.to_string()),
        };

        match self
            .generate_text(request.message.trim(), &request.history, &params)
            .await
        {
            Ok(reply) => ProxyOutcome::live(ChatReply {
                reply: reply.trim().to_string(),
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Therapist chat failed, serving canned reply");
                ProxyOutcome::canned("therapist_chat", fallback::therapist_reply())
            }
        }
    }

    /// `image_base64` must already be stripped of any `data:` prefix and
    /// validated with [`decode_image`].
    pub async fn analyze_posture(
        &self,
        image_base64: &str,
        request: &PostureAnalysisRequest,
    ) -> ProxyOutcome<PostureReport> {
        let started = Instant::now();
        let annotations = match self.vision.annotate(image_base64).await {
            Ok(annotations) => {
                metrics::record_provider_call("vision", "ok", started.elapsed());
                annotations
            }
            Err(e) => {
                metrics::record_provider_call("vision", e.kind(), started.elapsed());
                tracing::warn!(error = %e, "Image annotation failed, serving generic report");
                return ProxyOutcome::canned("posture", fallback::posture_report(None, vec![]));
            }
        };

        let observations = posture::observations(&annotations);
        let estimate = posture::heuristic_score(&annotations);

        match self
            .posture_report(&annotations, &observations, request)
            .await
        {
            Ok(mut report) => {
                report.score = report.score.clamp(0.0, 100.0);
                report.observations = observations;
                ProxyOutcome::live(report)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Posture report generation failed, serving generic report");
                ProxyOutcome::canned("posture", fallback::posture_report(estimate, observations))
            }
        }
    }

    async fn posture_report(
        &self,
        annotations: &ImageAnnotations,
        observations: &[String],
        request: &PostureAnalysisRequest,
    ) -> Result<PostureReport, AssistantError> {
        let prompt = prompts::posture_prompt(annotations, observations, request);
        let params = GenerationParams {
            temperature: Some(0.4),
            max_tokens: Some(1024),
            json_output: true,
            system_instruction: Some(prompts::COACH_SYSTEM_INSTRUCTION.to_string()),
        };

        let text = self.generate_text(&prompt, &[], &params).await?;
        parse_model_json::<PostureReport>(&text)
    }

    async fn generate_text(
        &self,
        prompt: &str,
        history: &[crate::services::providers::ChatTurn],
        params: &GenerationParams,
    ) -> Result<String, AssistantError> {
        let started = Instant::now();
        let result = self.text.generate(prompt, history, params).await;

        match result {
            Ok(ProviderResponse {
                text,
                input_tokens,
                output_tokens,
                finish_reason,
            }) => {
                metrics::record_provider_call("text", "ok", started.elapsed());
                metrics::record_tokens(input_tokens, output_tokens);
                if finish_reason == FinishReason::Length {
                    tracing::warn!(
                        output_tokens,
                        max_tokens = ?params.max_tokens,
                        "Model output truncated at the token limit"
                    );
                }
                text.filter(|t| !t.trim().is_empty())
                    .ok_or(AssistantError::EmptyResponse)
            }
            Err(e) => {
                metrics::record_provider_call("text", e.kind(), started.elapsed());
                Err(e.into())
            }
        }
    }
}

/// Parse model output as JSON, tolerating markdown fences and surrounding prose.
pub fn parse_model_json<T: DeserializeOwned>(text: &str) -> Result<T, AssistantError> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let start = trimmed.find(['{', '[']);
    let end = trimmed.rfind(['}', ']']);
    match (start, end) {
        (Some(start), Some(end)) if start < end => serde_json::from_str(&trimmed[start..=end])
            .map_err(|e| AssistantError::InvalidJson(e.to_string())),
        _ => Err(AssistantError::InvalidJson(
            "no JSON object found in model output".to_string(),
        )),
    }
}

/// Strip an optional `data:<mime>;base64,` prefix and check the payload
/// decodes. Returns the bare base64 text.
pub fn decode_image(image: &str) -> Result<&str, String> {
    let trimmed = image.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, data)| data)
            .ok_or_else(|| "image data URL must be base64 encoded".to_string())?,
        None => trimmed,
    };

    if payload.is_empty() {
        return Err("image is empty".to_string());
    }

    STANDARD
        .decode(payload)
        .map_err(|e| format!("image is not valid base64: {}", e))?;

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::mock::{MockTextProvider, MockVisionProvider};
    use crate::services::providers::FaceGeometry;

    fn assistant(text: MockTextProvider, vision: MockVisionProvider) -> WellnessAssistant {
        WellnessAssistant::new(Arc::new(text), Arc::new(vision))
    }

    fn plan_request() -> FitnessPlanRequest {
        FitnessPlanRequest {
            fitness_level: "intermediate".to_string(),
            goals: vec!["endurance".to_string()],
            age: None,
            available_minutes: None,
            equipment: vec!["dumbbells".to_string()],
            limitations: None,
        }
    }

    #[test]
    fn parses_fenced_json() {
        let value: Value = parse_model_json("```json\n{\"title\": \"x\"}\n```").unwrap();
        assert_eq!(value["title"], "x");
    }

    #[test]
    fn rejects_prose() {
        assert!(parse_model_json::<Value>("Sorry, I can't help").is_err());
    }

    #[test]
    fn decode_image_accepts_data_urls() {
        assert_eq!(
            decode_image("data:image/png;base64,aGVsbG8=").unwrap(),
            "aGVsbG8="
        );
        assert_eq!(decode_image(" aGVsbG8= ").unwrap(), "aGVsbG8=");
        assert!(decode_image("data:image/png,raw").is_err());
        assert!(decode_image("not base64!!").is_err());
        assert!(decode_image("data:image/png;base64,").is_err());
    }

    #[tokio::test]
    async fn fitness_plan_uses_model_json() {
        let a = assistant(
            MockTextProvider::with_response(r#"{"title": "Model plan", "weekly_schedule": []}"#),
            MockVisionProvider::failing(),
        );
        let outcome = a.fitness_plan(&plan_request()).await;
        assert!(!outcome.fallback);
        assert_eq!(outcome.data["title"], "Model plan");
    }

    #[tokio::test]
    async fn fitness_plan_falls_back_on_non_object_json() {
        let a = assistant(
            MockTextProvider::with_response("[1, 2, 3]"),
            MockVisionProvider::failing(),
        );
        let outcome = a.fitness_plan(&plan_request()).await;
        assert!(outcome.fallback);
        assert_eq!(outcome.data["title"], "Intermediate starter plan");
    }

    #[tokio::test]
    async fn fitness_plan_falls_back_on_truncated_json() {
        let a = assistant(
            MockTextProvider::truncated(r#"{"title": "Model plan", "weekly_sche"#),
            MockVisionProvider::failing(),
        );
        let outcome = a.fitness_plan(&plan_request()).await;
        assert!(outcome.fallback);
        assert_eq!(outcome.data["title"], "Intermediate starter plan");
    }

    #[tokio::test]
    async fn chat_passes_trimmed_message() {
        let text = Arc::new(MockTextProvider::with_response("  I hear you.  "));
        let a = WellnessAssistant::new(text.clone(), Arc::new(MockVisionProvider::failing()));
        let outcome = a
            .therapist_chat(&TherapistChatRequest {
                message: "  rough day  ".to_string(),
                history: vec![],
            })
            .await;

        assert!(!outcome.fallback);
        assert_eq!(outcome.data.reply, "I hear you.");
        assert_eq!(text.last_prompt().as_deref(), Some("rough day"));
    }

    #[tokio::test]
    async fn posture_skips_text_model_when_vision_fails() {
        let text = Arc::new(MockTextProvider::new(true));
        let a = WellnessAssistant::new(text.clone(), Arc::new(MockVisionProvider::failing()));
        let request = PostureAnalysisRequest {
            image: "aGVsbG8=".to_string(),
            notes: None,
        };

        let outcome = a.analyze_posture("aGVsbG8=", &request).await;
        assert!(outcome.fallback);
        assert_eq!(outcome.data.score, fallback::DEFAULT_POSTURE_SCORE);
        assert_eq!(text.calls(), 0);
    }

    #[tokio::test]
    async fn posture_fallback_keeps_heuristic_score() {
        let annotations = ImageAnnotations {
            faces: vec![FaceGeometry {
                roll_angle: 0.0,
                pan_angle: 0.0,
                tilt_angle: -25.0,
                detection_confidence: 0.9,
            }],
            ..Default::default()
        };
        let a = assistant(
            MockTextProvider::new(false),
            MockVisionProvider::new(annotations),
        );
        let request = PostureAnalysisRequest {
            image: "aGVsbG8=".to_string(),
            notes: None,
        };

        let outcome = a.analyze_posture("aGVsbG8=", &request).await;
        assert!(outcome.fallback);
        assert_eq!(outcome.data.score, 70.0);
        assert!(!outcome.data.observations.is_empty());
    }

    #[tokio::test]
    async fn posture_score_is_clamped() {
        let a = assistant(
            MockTextProvider::with_response(
                r#"{"score": 140, "summary": "Great", "issues": [], "recommendations": []}"#,
            ),
            MockVisionProvider::new(ImageAnnotations::default()),
        );
        let request = PostureAnalysisRequest {
            image: "aGVsbG8=".to_string(),
            notes: None,
        };

        let outcome = a.analyze_posture("aGVsbG8=", &request).await;
        assert!(!outcome.fallback);
        assert_eq!(outcome.data.score, 100.0);
    }
}

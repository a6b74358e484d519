//! Gemini AI provider implementation.
//!
//! Implements text generation using Google's Gemini `generateContent` API.
//! One request per call, no retries.

use super::{
    google_headers, network_error, ChatRole, ChatTurn, FinishReason, GenerationParams,
    ProviderError, ProviderResponse, TextProvider,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    /// e.g. `https://generativelanguage.googleapis.com/v1beta`
    pub api_base: String,
}

/// Gemini text provider.
pub struct GeminiTextProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiTextProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Build the API URL for the given model and method. The key travels in
    /// a header, never in the URL.
    fn api_url(&self, method: Option<&str>) -> String {
        let base = format!(
            "{}/models/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        );
        match method {
            Some(method) => format!("{}:{}", base, method),
            None => base,
        }
    }

    fn build_request(
        &self,
        prompt: &str,
        history: &[ChatTurn],
        params: &GenerationParams,
    ) -> GenerateContentRequest {
        let mut contents: Vec<Content> = history
            .iter()
            .filter(|turn| !turn.content.trim().is_empty())
            .map(|turn| Content {
                role: Some(
                    match turn.role {
                        ChatRole::User => "user",
                        ChatRole::Assistant => "model",
                    }
                    .to_string(),
                ),
                parts: vec![ContentPart {
                    text: turn.content.clone(),
                }],
            })
            .collect();

        contents.push(Content {
            role: Some("user".to_string()),
            parts: vec![ContentPart {
                text: prompt.to_string(),
            }],
        });

        GenerateContentRequest {
            contents,
            system_instruction: params.system_instruction.as_ref().map(|text| Content {
                role: None,
                parts: vec![ContentPart { text: text.clone() }],
            }),
            generation_config: Some(GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_tokens,
                response_mime_type: params
                    .json_output
                    .then(|| "application/json".to_string()),
            }),
        }
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        history: &[ChatTurn],
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        let request = self.build_request(prompt, history, params);
        let url = self.api_url(Some("generateContent"));

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            history_len = history.len(),
            json_output = params.json_output,
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .headers(google_headers(&self.config.api_key)?)
            .json(&request)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| {
                ProviderError::ApiError(format!("Failed to parse response: {}", e.without_url()))
            })?;

        if let Some(reason) = api_response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_ref())
        {
            tracing::warn!(reason = %reason, "Gemini blocked the prompt");
            return Err(ProviderError::ContentFiltered);
        }

        let candidate = api_response
            .candidates
            .first()
            .ok_or_else(|| ProviderError::ApiError("Gemini returned no candidates".to_string()))?;

        // Multi-part answers are concatenated in order.
        let text = candidate
            .content
            .as_ref()
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .filter(|t| !t.is_empty());

        let finish_reason = finish_reason_from(candidate.finish_reason.as_deref());

        if finish_reason == FinishReason::ContentFilter {
            return Err(ProviderError::ContentFiltered);
        }

        let usage = api_response.usage_metadata.unwrap_or_default();

        Ok(ProviderResponse {
            text,
            input_tokens: usage.prompt_token_count.unwrap_or(0),
            output_tokens: usage.candidates_token_count.unwrap_or(0),
            finish_reason,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        // Fetching the model metadata verifies both the key and the model name.
        let response = self
            .client
            .get(self.api_url(None))
            .headers(google_headers(&self.config.api_key)?)
            .send()
            .await
            .map_err(network_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::ApiError(format!(
                "Health check failed: {}",
                response.status()
            )))
        }
    }
}

fn finish_reason_from(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("MAX_TOKENS") => FinishReason::Length,
        Some("SAFETY") | Some("RECITATION") | Some("BLOCKLIST") | Some("PROHIBITED_CONTENT") => {
            FinishReason::ContentFilter
        }
        // STOP, a missing reason, or one we don't know: the text decides.
        _ => FinishReason::Complete,
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GeminiTextProvider {
        GeminiTextProvider::new(GeminiConfig {
            api_key: "k".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_base: "https://example.test/v1beta/".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn api_url_names_model_but_not_key() {
        assert_eq!(
            provider().api_url(Some("generateContent")),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(
            provider().api_url(None),
            "https://example.test/v1beta/models/gemini-2.0-flash"
        );
    }

    #[tokio::test]
    async fn network_errors_do_not_carry_the_key() {
        let provider = GeminiTextProvider::new(GeminiConfig {
            api_key: "SUPER-SECRET-KEY".to_string(),
            model: "m".to_string(),
            api_base: "http://127.0.0.1:9".to_string(),
        })
        .unwrap();

        let err = provider
            .generate("hi", &[], &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NetworkError(_)));
        assert!(!err.to_string().contains("SUPER-SECRET-KEY"));

        let err = provider.health_check().await.unwrap_err();
        assert!(!err.to_string().contains("SUPER-SECRET-KEY"));
    }

    #[test]
    fn request_maps_history_roles_and_json_mode() {
        let history = vec![
            ChatTurn {
                role: ChatRole::User,
                content: "hi".to_string(),
            },
            ChatTurn {
                role: ChatRole::Assistant,
                content: "hello".to_string(),
            },
            ChatTurn {
                role: ChatRole::User,
                content: "   ".to_string(),
            },
        ];
        let params = GenerationParams {
            json_output: true,
            system_instruction: Some("be kind".to_string()),
            ..Default::default()
        };

        let body = serde_json::to_value(provider().build_request("now", &history, &params)).unwrap();

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "now");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be kind");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn response_parts_are_concatenated() {
        let raw = r#"{
            "candidates": [{"content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": "1}"}]}, "finishReason": "STOP"}],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4}
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        assert_eq!(text, "{\"a\":1}");
        assert_eq!(
            finish_reason_from(parsed.candidates[0].finish_reason.as_deref()),
            FinishReason::Complete
        );
    }

    #[test]
    fn safety_finish_is_content_filter() {
        assert_eq!(finish_reason_from(Some("SAFETY")), FinishReason::ContentFilter);
        assert_eq!(finish_reason_from(Some("MAX_TOKENS")), FinishReason::Length);
        assert_eq!(finish_reason_from(Some("OTHER")), FinishReason::Complete);
    }
}

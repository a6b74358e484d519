//! Mock provider implementations for testing.

use super::{
    ChatTurn, FinishReason, GenerationParams, ImageAnnotations, ProviderError, ProviderResponse,
    TextProvider, VisionProvider,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Mock text provider for testing.
///
/// A disabled mock fails every call, which drives the fallback paths.
pub struct MockTextProvider {
    enabled: bool,
    response: Option<String>,
    finish_reason: FinishReason,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            response: None,
            finish_reason: FinishReason::Complete,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Always answer with `text`.
    pub fn with_response(text: impl Into<String>) -> Self {
        Self {
            response: Some(text.into()),
            ..Self::new(true)
        }
    }

    /// Answer with `text` as if generation hit the token limit.
    pub fn truncated(text: impl Into<String>) -> Self {
        Self {
            finish_reason: FinishReason::Length,
            ..Self::with_response(text)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(
        &self,
        prompt: &str,
        _history: &[ChatTurn],
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }

        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ));
        }

        let text = self
            .response
            .clone()
            .unwrap_or_else(|| format!("Mock response for: {}", prompt));

        Ok(ProviderResponse {
            text: Some(text),
            input_tokens: prompt.len() as i32 / 4,
            output_tokens: 10,
            finish_reason: self.finish_reason,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ))
        }
    }
}

/// Mock vision provider for testing.
pub struct MockVisionProvider {
    annotations: Option<ImageAnnotations>,
}

impl MockVisionProvider {
    /// Succeeds with the given annotations.
    pub fn new(annotations: ImageAnnotations) -> Self {
        Self {
            annotations: Some(annotations),
        }
    }

    /// Fails every call.
    pub fn failing() -> Self {
        Self { annotations: None }
    }
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    async fn annotate(&self, _image_base64: &str) -> Result<ImageAnnotations, ProviderError> {
        self.annotations.clone().ok_or_else(|| {
            ProviderError::NetworkError("Mock vision provider unavailable".to_string())
        })
    }
}

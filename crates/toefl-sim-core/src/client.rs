//! Model client: one prompt in, one piece of text out.
//!
//! Wraps an [`LlmProvider`] with the model name and sampling parameters and
//! turns every failure into a typed [`GenerationError`]. Callers that only
//! want something to show the user use [`ModelClient::complete_or_placeholder`].

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use crate::error::GenerationError;
use crate::traits::{GenerateRequest, LlmProvider, ModelInfo};

/// Default token budget per request.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Per-request sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl GenerationParams {
    pub fn with_temperature(temperature: f64) -> Self {
        Self {
            temperature,
            ..Default::default()
        }
    }
}

/// Retry behaviour for transient failures. Zero retries by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
}

/// Upper bound on any single wait between attempts, retry-after hints included.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_secs(1),
        }
    }
}

/// User-visible text for a failed generation.
pub fn placeholder(err: &GenerationError) -> String {
    format!("Error: {err}")
}

/// Issues generation requests against a single model.
#[derive(Clone)]
pub struct ModelClient {
    provider: Arc<dyn LlmProvider>,
    model: String,
    retry: RetryPolicy,
}

impl std::fmt::Debug for ModelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelClient")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ModelClient {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Models the underlying provider advertises.
    pub fn available_models(&self) -> Vec<ModelInfo> {
        self.provider.available_models()
    }

    /// Generate text for `prompt`.
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    pub async fn complete(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, GenerationError> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        let mut delay = self.retry.initial_delay;
        let mut attempt = 0;
        loop {
            let err = match self.provider.generate(&request).await {
                Ok(response) if response.content.trim().is_empty() => GenerationError::EmptyText,
                Ok(response) => {
                    tracing::debug!(
                        latency_ms = response.latency_ms,
                        total_tokens = response.token_usage.total_tokens,
                        "generation complete"
                    );
                    return Ok(response.content);
                }
                Err(e) => GenerationError::from_anyhow(e),
            };

            if err.is_permanent() || attempt >= self.retry.max_retries {
                tracing::warn!(error = %err, attempt, "generation failed");
                return Err(err);
            }

            // Use the provider's retry-after hint if available
            if let GenerationError::Provider(p) = &err {
                if let Some(ms) = p.retry_after_ms() {
                    delay = Duration::from_millis(ms).min(MAX_RETRY_DELAY);
                }
            }
            tracing::info!(error = %err, attempt, delay_ms = delay.as_millis() as u64, "retrying generation");
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(MAX_RETRY_DELAY);
            attempt += 1;
        }
    }

    /// Generate text, or a placeholder message if anything goes wrong. Never fails.
    pub async fn complete_or_placeholder(&self, prompt: &str, params: GenerationParams) -> String {
        match self.complete(prompt, params).await {
            Ok(text) => text,
            Err(e) => placeholder(&e),
        }
    }

    /// Send a tiny request to confirm the key and model work.
    pub async fn check(&self) -> Result<(), GenerationError> {
        self.complete(
            "Test",
            GenerationParams {
                temperature: 0.0,
                max_tokens: 10,
            },
        )
        .await
        .map(|_| ())
    }
}

/// `true` if `text` is one of this module's placeholders rather than model output.
pub fn is_placeholder(text: &str) -> bool {
    text.starts_with("Error: ")
}

//! Error types.
//!
//! `ProviderError` lives in `toefl-sim-core` so the model client can downcast
//! provider failures and classify them for retry decisions without string
//! matching.

use thiserror::Error;

/// Errors that can occur when interacting with an LLM provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid or missing API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The response carried no candidate text.
    #[error("response contained no text candidates")]
    EmptyResponse,

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Typed result of a text generation request.
///
/// Every variant collapses to the same user-visible placeholder via
/// [`crate::client::placeholder`], but callers that care can tell the causes
/// apart.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The provider reported a classified failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The model answered, but with nothing but whitespace.
    #[error("model returned empty text")]
    EmptyText,

    /// Any other failure (transport, decoding) that the provider did not classify.
    #[error("{0}")]
    Other(String),
}

impl GenerationError {
    /// Classify an `anyhow` error coming out of an [`crate::traits::LlmProvider`].
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        match err.downcast::<ProviderError>() {
            Ok(provider) => GenerationError::Provider(provider),
            Err(other) => GenerationError::Other(format!("{other:#}")),
        }
    }

    /// Returns `true` if retrying cannot help.
    pub fn is_permanent(&self) -> bool {
        match self {
            GenerationError::Provider(e) => e.is_permanent(),
            GenerationError::EmptyText | GenerationError::Other(_) => false,
        }
    }
}

/// Errors produced while interpreting model output.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("could not find a JSON array in the response")]
    NoJsonArray,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("expected a list of questions")]
    NotAList,

    #[error("no questions found in response")]
    NoQuestions,

    #[error("missing rubric score for {0}")]
    MissingScore(&'static str),

    #[error("score out of range for {dimension}: {value}")]
    ScoreOutOfRange { dimension: &'static str, value: u32 },

    #[error("score for {dimension} is not a whole number: {value}")]
    NotAWholeNumber { dimension: &'static str, value: String },

    #[error("missing recommendations")]
    MissingRecommendations,
}

/// Errors raised by the practice workflow handlers.
#[derive(Debug, Error)]
pub enum PracticeError {
    #[error("invalid reading options: {0}")]
    InvalidOptions(String),

    #[error("failed to generate {stage}: {source}")]
    Generation {
        stage: &'static str,
        #[source]
        source: GenerationError,
    },

    #[error("failed to read generated questions: {0}")]
    Questions(#[from] ParseError),

    #[error("{action} is not available on the {view} screen")]
    WrongView {
        action: &'static str,
        view: &'static str,
    },

    #[error("question {0} does not exist")]
    NoSuchQuestion(usize),

    #[error("choice {0} is out of range")]
    NoSuchChoice(usize),

    #[error("answers were already submitted")]
    AlreadySubmitted,

    #[error("please write your essay before submitting")]
    EmptyEssay,
}

/// Language-model provider abstraction
///
/// The recommendation flow only needs "send two chat turns, get text back"; the provider
/// owns the wire format and maps its HTTP failures onto `AppError` so the caller sees the
/// same retry semantics regardless of vendor.
use crate::{error::AppResult, models::ChatCompletionRequest};

pub mod openai;

pub use openai::OpenAiProvider;

/// Trait for chat-completion providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Runs one completion and returns the first choice's text
    ///
    /// The key is passed per call so a missing secret is caught before any provider is
    /// touched. Implementations must not retry: a rate-limit signal has to reach the caller.
    async fn complete(&self, api_key: &str, request: &ChatCompletionRequest) -> AppResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

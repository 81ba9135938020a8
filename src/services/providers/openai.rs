/// OpenAI-compatible chat completion provider
///
/// Calls `POST {api_url}/chat/completions` and returns the text of the first choice.
/// Status mapping:
/// - 429 → `RateLimited` (caller may retry after backoff)
/// - 401 / 402 → `ProviderConfiguration` (operator problem, not retryable)
/// - anything else non-2xx → `ProviderFailure`
use crate::{
    error::{AppError, AppResult},
    models::{ChatCompletionRequest, ChatCompletionResponse},
    services::providers::CompletionProvider,
};
use reqwest::{Client as HttpClient, StatusCode};

#[derive(Clone)]
pub struct OpenAiProvider {
    http_client: HttpClient,
    api_url: String,
}

impl OpenAiProvider {
    pub fn new(api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_url.trim_end_matches('/'))
    }
}

/// Maps a non-success provider status onto the caller-facing error
pub fn classify_status(status: StatusCode, body: String) -> AppError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => AppError::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::PAYMENT_REQUIRED => AppError::ProviderConfiguration,
        _ => AppError::ProviderFailure(format!("Provider returned status {}: {}", status, body)),
    }
}

#[async_trait::async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, api_key: &str, request: &ChatCompletionRequest) -> AppResult<String> {
        let response = self
            .http_client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, provider = "openai", "Completion request failed");
                if e.is_timeout() {
                    AppError::ProviderTimeout
                } else {
                    AppError::ProviderFailure(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                provider = "openai",
                "Completion API returned an error"
            );
            return Err(classify_status(status, body));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| AppError::ProviderFailure(e.to_string()))?;

        let completion: ChatCompletionResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                tracing::error!(
                    error = %e,
                    response = %response_text,
                    "Failed to deserialize completion response"
                );
                AppError::InvalidCompletion
            })?;

        let content = completion.first_content().ok_or_else(|| {
            tracing::error!(provider = "openai", "No content in completion response");
            AppError::InvalidCompletion
        })?;

        tracing::debug!(content = %content, provider = "openai", "Completion received");

        Ok(content.to_string())
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

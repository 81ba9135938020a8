use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application-level errors
///
/// Every variant renders as the same JSON envelope (`{ "error": ..., "details"?: ... }`),
/// so callers can drive their retry policy purely off the status code.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// The language-model secret is missing; no provider call is attempted
    #[error("AI service not configured. Please contact administrator.")]
    NotConfigured,

    #[error("Missing authorization header")]
    MissingAuthorization,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Failed to fetch modules")]
    ModuleFetch(#[source] sqlx::Error),

    #[error("AI service is currently rate limited. Please try again in a moment.")]
    RateLimited,

    /// Provider rejected our credentials or billing; operator problem, never retried
    #[error("AI service configuration issue. Please contact administrator.")]
    ProviderConfiguration,

    #[error("Failed to generate recommendations")]
    ProviderFailure(String),

    #[error("AI service timed out. Please try again later.")]
    ProviderTimeout,

    #[error("Invalid AI response")]
    InvalidCompletion,

    #[error("Failed to parse AI recommendations")]
    UnparsableRecommendations(#[source] serde_json::Error),

    #[error("Invalid recommendations format")]
    InvalidRecommendations(String),

    #[error("Failed to store recommendations")]
    Persistence(#[source] sqlx::Error),

    #[error("Failed to fetch recommendations")]
    RecommendationFetch(#[source] sqlx::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// JSON body returned for every failure
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingAuthorization | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::ProviderTimeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotConfigured
            | AppError::ModuleFetch(_)
            | AppError::ProviderConfiguration
            | AppError::ProviderFailure(_)
            | AppError::InvalidCompletion
            | AppError::UnparsableRecommendations(_)
            | AppError::InvalidRecommendations(_)
            | AppError::Persistence(_)
            | AppError::RecommendationFetch(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Builds the response envelope
    ///
    /// Only unexpected failures carry `details`. Upstream and provider errors are logged
    /// where they happen and never echoed back.
    pub fn body(&self) -> ErrorBody {
        match self {
            AppError::Internal(details) => ErrorBody {
                error: "An unexpected error occurred".to_string(),
                details: Some(details.clone()),
            },
            other => ErrorBody {
                error: other.to_string(),
                details: None,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Converts a handler panic into the unexpected-error envelope
pub fn panic_response(panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let details = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "handler panicked".to_string()
    };

    tracing::error!(details = %details, "Handler panicked");
    AppError::Internal(details).into_response()
}

use std::{collections::HashSet, sync::Arc, time::Duration};

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    config::Config,
    db::LearningStore,
    error::{AppError, AppResult},
    models::{
        ActiveRecommendationsResponse, ChatCompletionRequest, GenerateRequest, GenerateResponse,
        LearningPreferences, ModuleSummary, NewRecommendation, Suggestion, single_line,
    },
    services::{
        auth::{self, IdentityProvider},
        prompt::{self, LearningContext},
        providers::CompletionProvider,
    },
};

/// Number of progress entries sent to the model
pub const RECENT_PROGRESS_LIMIT: i64 = 10;

pub const DEFAULT_ACTIVE_LIMIT: u32 = 5;
pub const MAX_ACTIVE_LIMIT: u32 = 20;

/// Explicit settings for the generator; nothing here is read from the environment
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    /// `None` makes every generate request fail before any provider call
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Upper bound on the provider call
    pub timeout: Duration,
}

impl From<&Config> for GeneratorSettings {
    fn from(config: &Config) -> Self {
        Self {
            api_key: config.llm_api_key(),
            model: config.openai_model.clone(),
            temperature: config.openai_temperature,
            max_tokens: config.openai_max_tokens,
            timeout: Duration::from_secs(config.openai_timeout_secs),
        }
    }
}

/// Generates, stores and lists personalized module recommendations
///
/// Each `generate` call is independent: it authenticates the caller, gathers their learning
/// context, asks the language model for suggestions, validates them and inserts exactly one
/// record. Nothing is retried internally and nothing is written on any failure path.
/// Concurrent calls for the same user each insert their own row.
pub struct RecommendationService {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn LearningStore>,
    provider: Arc<dyn CompletionProvider>,
    settings: GeneratorSettings,
}

impl RecommendationService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn LearningStore>,
        provider: Arc<dyn CompletionProvider>,
        settings: GeneratorSettings,
    ) -> Self {
        Self {
            identity,
            store,
            provider,
            settings,
        }
    }

    pub async fn generate(
        &self,
        authorization: Option<&str>,
        body: &[u8],
    ) -> AppResult<GenerateResponse> {
        let api_key = self.settings.api_key.as_deref().ok_or_else(|| {
            tracing::error!("Language model API key not configured");
            AppError::NotConfigured
        })?;

        let user = auth::authenticate(self.identity.as_ref(), authorization).await?;
        let request = parse_request(body)?;

        if let Some(claimed) = request.claimed_user_id() {
            if Uuid::parse_str(&claimed).ok() != Some(user.id) {
                tracing::warn!(
                    claimed_user_id = %claimed,
                    user_id = %user.id,
                    "Body user_id differs from token identity; using token identity"
                );
            }
        }

        tracing::info!(user_id = %user.id, "Generating recommendations");

        let context = self.assemble_context(user.id).await?;

        let completion_request = ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: prompt::build_messages(&context)?,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        tracing::info!(
            user_id = %user.id,
            provider = self.provider.name(),
            modules = context.modules.len(),
            progress_entries = context.recent_progress.len(),
            "Calling language model"
        );

        let content = self.complete_with_timeout(api_key, &completion_request).await?;
        let suggestions = parse_suggestions(&content)?;
        warn_on_unverified(&context.modules, &suggestions);

        let record = self
            .store
            .insert_recommendation(NewRecommendation::from_suggestions(user.id, &suggestions))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id = %user.id, "Failed to store recommendations");
                AppError::Persistence(e)
            })?;

        tracing::info!(
            user_id = %user.id,
            recommendation_id = %record.id,
            suggestions = suggestions.len(),
            confidence = record.confidence_score,
            "Recommendations stored"
        );

        Ok(GenerateResponse {
            success: true,
            recommendation: record,
            suggestions,
        })
    }

    /// Unexpired records for the caller, newest first
    pub async fn active_recommendations(
        &self,
        authorization: Option<&str>,
        limit: Option<u32>,
    ) -> AppResult<ActiveRecommendationsResponse> {
        let user = auth::authenticate(self.identity.as_ref(), authorization).await?;

        let limit = limit.unwrap_or(DEFAULT_ACTIVE_LIMIT);
        if !(1..=MAX_ACTIVE_LIMIT).contains(&limit) {
            return Err(AppError::InvalidInput(format!(
                "limit must be between 1 and {}",
                MAX_ACTIVE_LIMIT
            )));
        }

        let recommendations = self
            .store
            .list_active_recommendations(user.id, Utc::now(), i64::from(limit))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id = %user.id, "Failed to fetch recommendations");
                AppError::RecommendationFetch(e)
            })?;

        Ok(ActiveRecommendationsResponse { recommendations })
    }

    /// Reads catalog, progress and preferences concurrently
    ///
    /// Only the catalog is required; progress and preferences fall back to empty.
    async fn assemble_context(&self, user_id: Uuid) -> AppResult<LearningContext> {
        let (modules, progress, preferences) = tokio::join!(
            self.store.fetch_modules(),
            self.store.fetch_recent_progress(user_id, RECENT_PROGRESS_LIMIT),
            self.store.fetch_preferences(user_id),
        );

        let modules = modules.map_err(|e| {
            tracing::error!(error = %e, "Error fetching modules");
            AppError::ModuleFetch(e)
        })?;

        let recent_progress = progress.unwrap_or_else(|e| {
            tracing::warn!(error = %e, user_id = %user_id, "Error fetching progress; continuing without it");
            Vec::new()
        });

        let preferences = match preferences {
            Ok(preferences) => preferences.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, user_id = %user_id, "Error fetching preferences; continuing without them");
                LearningPreferences::default()
            }
        };

        Ok(LearningContext {
            modules,
            recent_progress,
            preferences,
        })
    }

    async fn complete_with_timeout(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> AppResult<String> {
        match tokio::time::timeout(self.settings.timeout, self.provider.complete(api_key, request))
            .await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    timeout_ms = self.settings.timeout.as_millis() as u64,
                    provider = self.provider.name(),
                    "Language model call timed out"
                );
                Err(AppError::ProviderTimeout)
            }
        }
    }
}

/// Parses the optional request body
///
/// Only syntactically invalid JSON is rejected. An empty body, `null` or any other
/// non-object document is an empty request.
fn parse_request(body: &[u8]) -> AppResult<GenerateRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(GenerateRequest::default());
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::Internal(format!("Invalid request body: {}", e)))?;

    Ok(GenerateRequest::from_value(value))
}

/// Validates model output into suggestions
///
/// The text must be a JSON object with a `suggestions` array. Each entry needs a
/// non-empty `module_id` (numbers are coerced to strings), a non-empty `reason` and a
/// numeric `confidence` (numeric strings are accepted). Catalog membership and the 0-1
/// range are not enforced here.
pub fn parse_suggestions(content: &str) -> AppResult<Vec<Suggestion>> {
    let parsed: Value = serde_json::from_str(content).map_err(|e| {
        tracing::error!(error = %e, content = %content, "Failed to parse AI response");
        AppError::UnparsableRecommendations(e)
    })?;

    let items = parsed
        .get("suggestions")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            tracing::error!(response = %parsed, "Invalid recommendations format");
            AppError::InvalidRecommendations("missing `suggestions` array".to_string())
        })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            suggestion_from_value(item).map_err(|field| {
                tracing::error!(index, field, item = %item, "Invalid suggestion");
                AppError::InvalidRecommendations(format!(
                    "suggestion {} has an invalid `{}`",
                    index, field
                ))
            })
        })
        .collect()
}

fn suggestion_from_value(item: &Value) -> Result<Suggestion, &'static str> {
    let module_id = match item.get("module_id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => return Err("module_id"),
    };

    let reason = match item.get("reason") {
        Some(Value::String(reason)) => single_line(reason),
        _ => return Err("reason"),
    };
    if reason.is_empty() {
        return Err("reason");
    }

    let confidence = match item.get("confidence") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|c| c.is_finite())
    .ok_or("confidence")?;

    Ok(Suggestion {
        module_id,
        reason,
        confidence,
    })
}

fn warn_on_unverified(modules: &[ModuleSummary], suggestions: &[Suggestion]) {
    let known: HashSet<&str> = modules.iter().map(|m| m.id.as_str()).collect();

    for suggestion in suggestions {
        if !known.contains(suggestion.module_id.as_str()) {
            tracing::warn!(module_id = %suggestion.module_id, "Suggested module is not in the catalog");
        }
        if !(0.0..=1.0).contains(&suggestion.confidence) {
            tracing::warn!(
                module_id = %suggestion.module_id,
                confidence = suggestion.confidence,
                "Suggestion confidence outside 0-1"
            );
        }
    }
}

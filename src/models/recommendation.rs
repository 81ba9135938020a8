use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Days a stored recommendation stays visible to readers
pub const RECOMMENDATION_TTL_DAYS: i64 = 7;

/// A single model-proposed module with its rationale
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    pub module_id: String,
    pub reason: String,
    /// Model self-reported certainty; contractually 0-1 but passed through as returned
    pub confidence: f64,
}

/// Persisted bundle of suggestions, readable until `expires_at`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct RecommendationRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Ordered by suggestion rank
    pub suggested_module_ids: Vec<String>,
    pub reasoning: String,
    pub confidence_score: f64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Row to insert; the store assigns `id`, `created_at` and `expires_at`
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecommendation {
    pub user_id: Uuid,
    pub suggested_module_ids: Vec<String>,
    pub reasoning: String,
    pub confidence_score: f64,
}

impl NewRecommendation {
    /// Aggregates validated suggestions into a single record, preserving their order
    pub fn from_suggestions(user_id: Uuid, suggestions: &[Suggestion]) -> Self {
        Self {
            user_id,
            suggested_module_ids: suggestions.iter().map(|s| s.module_id.clone()).collect(),
            reasoning: format_reasoning(suggestions),
            confidence_score: mean_confidence(suggestions),
        }
    }
}

/// Arithmetic mean of suggestion confidences; 0.0 for an empty list
pub fn mean_confidence(suggestions: &[Suggestion]) -> f64 {
    if suggestions.is_empty() {
        return 0.0;
    }
    let total: f64 = suggestions.iter().map(|s| s.confidence).sum();
    total / suggestions.len() as f64
}

/// Collapses line breaks (and the blank space around them) into single spaces
pub fn single_line(text: &str) -> String {
    text.split(|c| c == '\n' || c == '\r')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// One `"<rank>. <reason>"` line per suggestion, 1-indexed
pub fn format_reasoning(suggestions: &[Suggestion]) -> String {
    suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, single_line(&s.reason)))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// HTTP payloads
// ============================================================================

/// Body of a generate request
///
/// `user_id` is informational: storage always uses the identity behind the bearer token.
/// The remaining fields are accepted for forward compatibility and currently unused, so
/// every field is kept as untyped JSON and never fails a request on its shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub module_preferences: Option<Value>,
    #[serde(default)]
    pub recent_progress: Option<Value>,
}

impl GenerateRequest {
    /// Builds a request from any JSON document; non-objects (`null` included) are empty
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    /// The claimed user id rendered as text, whatever JSON type it arrived as
    pub fn claimed_user_id(&self) -> Option<String> {
        match self.user_id.as_ref()? {
            Value::Null => None,
            Value::String(id) => Some(id.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub recommendation: RecommendationRecord,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Serialize)]
pub struct ActiveRecommendationsResponse {
    pub recommendations: Vec<RecommendationRecord>,
}

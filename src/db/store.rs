use chrono::{DateTime, Utc};
use sqlx::Error as SqlxError;
use uuid::Uuid;

use crate::models::{
    LearningPreferences, ModuleSummary, NewRecommendation, ProgressEntry, RecommendationRecord,
};

/// Storage seam for everything the recommendation flow reads or writes
///
/// Implementations return raw `sqlx::Error`s; the caller decides which failures are fatal
/// (catalog, insert) and which fall back to an empty default (progress, preferences).
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LearningStore: Send + Sync {
    /// Full module catalog
    async fn fetch_modules(&self) -> Result<Vec<ModuleSummary>, SqlxError>;

    /// Up to `limit` progress entries for the user, newest first
    async fn fetch_recent_progress(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ProgressEntry>, SqlxError>;

    /// Stored preferences, `None` when the user has no profile row
    async fn fetch_preferences(
        &self,
        user_id: Uuid,
    ) -> Result<Option<LearningPreferences>, SqlxError>;

    /// Inserts one row and returns it as stored
    async fn insert_recommendation(
        &self,
        recommendation: NewRecommendation,
    ) -> Result<RecommendationRecord, SqlxError>;

    /// Records with `expires_at > now`, newest first
    async fn list_active_recommendations(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RecommendationRecord>, SqlxError>;
}

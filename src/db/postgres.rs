use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::{
    db::LearningStore,
    models::{
        LearningPreferences, ModuleRow, ModuleSummary, NewRecommendation, ProgressEntry,
        RecommendationRecord,
    },
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// `LearningStore` backed by the hosted Postgres database
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LearningStore for PgStore {
    async fn fetch_modules(&self) -> Result<Vec<ModuleSummary>, sqlx::Error> {
        let rows = sqlx::query_as::<_, ModuleRow>(
            r#"
            SELECT id::text AS id, title, description, level,
                   ai_tags, estimated_time_minutes
            FROM learning_modules
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let modules: Vec<ModuleSummary> = rows.into_iter().map(ModuleSummary::from).collect();

        let unknown_levels = modules.iter().filter(|m| !m.level.is_known()).count();
        if unknown_levels > 0 {
            tracing::warn!(
                modules = modules.len(),
                unknown_levels,
                "Catalog contains modules with an unrecognized level"
            );
        }

        Ok(modules)
    }

    async fn fetch_recent_progress(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ProgressEntry>, sqlx::Error> {
        sqlx::query_as::<_, ProgressEntry>(
            r#"
            SELECT module_id::text AS module_id, completion_score,
                   time_spent_minutes, created_at
            FROM progress_logs
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    async fn fetch_preferences(
        &self,
        user_id: Uuid,
    ) -> Result<Option<LearningPreferences>, sqlx::Error> {
        let preferences: Option<Option<Value>> = sqlx::query_scalar(
            r#"
            SELECT learning_preferences
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(preferences.flatten().map(LearningPreferences::from_value))
    }

    async fn insert_recommendation(
        &self,
        recommendation: NewRecommendation,
    ) -> Result<RecommendationRecord, sqlx::Error> {
        sqlx::query_as::<_, RecommendationRecord>(
            r#"
            INSERT INTO ai_recommendations
                (user_id, suggested_module_ids, reasoning, confidence_score)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, suggested_module_ids, reasoning,
                      confidence_score, created_at, expires_at
            "#,
        )
        .bind(recommendation.user_id)
        .bind(&recommendation.suggested_module_ids)
        .bind(&recommendation.reasoning)
        .bind(recommendation.confidence_score)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_active_recommendations(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RecommendationRecord>, sqlx::Error> {
        sqlx::query_as::<_, RecommendationRecord>(
            r#"
            SELECT id, user_id, suggested_module_ids, reasoning,
                   confidence_score, created_at, expires_at
            FROM ai_recommendations
            WHERE user_id = $1 AND expires_at > $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}

#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum_test::TestServer;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use coach_api::{
    api::{create_router, AppState},
    db::LearningStore,
    error::{AppError, AppResult},
    models::{
        AuthenticatedUser, ChatCompletionRequest, LearningPreferences, ModuleLevel,
        ModuleSummary, NewRecommendation, ProgressEntry, RecommendationRecord,
        RECOMMENDATION_TTL_DAYS,
    },
    services::{CompletionProvider, GeneratorSettings, IdentityProvider},
};

pub const VALID_TOKEN: &str = "valid-token";
pub const API_KEY: &str = "sk-test";

pub const TWO_SUGGESTIONS: &str = r#"{ "suggestions": [
    { "module_id": "a", "reason": "x", "confidence": 0.9 },
    { "module_id": "b", "reason": "y", "confidence": 0.7 }
] }"#;

/// Accepts exactly `VALID_TOKEN`
pub struct FakeIdentity {
    pub user_id: Uuid,
}

#[async_trait::async_trait]
impl IdentityProvider for FakeIdentity {
    async fn verify(&self, token: &str) -> AppResult<AuthenticatedUser> {
        if token == VALID_TOKEN {
            Ok(AuthenticatedUser {
                id: self.user_id,
                email: Some("learner@example.com".to_string()),
            })
        } else {
            Err(AppError::Unauthorized)
        }
    }
}

/// What the fake provider does when called
#[derive(Clone)]
pub enum Script {
    Content(&'static str),
    RateLimited,
    ProviderConfiguration,
    Failure,
    InvalidCompletion,
    Hang(Duration),
    Panic,
}

pub struct ScriptedProvider {
    script: Script,
    pub calls: AtomicUsize,
    last_request: Mutex<Option<ChatCompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub async fn last_request(&self) -> Option<ChatCompletionRequest> {
        self.last_request.lock().await.clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, api_key: &str, request: &ChatCompletionRequest) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().await = Some(request.clone());
        assert_eq!(api_key, API_KEY);

        match &self.script {
            Script::Content(content) => Ok(content.to_string()),
            Script::RateLimited => Err(AppError::RateLimited),
            Script::ProviderConfiguration => Err(AppError::ProviderConfiguration),
            Script::Failure => Err(AppError::ProviderFailure("status 503".to_string())),
            Script::InvalidCompletion => Err(AppError::InvalidCompletion),
            Script::Hang(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(TWO_SUGGESTIONS.to_string())
            }
            Script::Panic => panic!("provider exploded"),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// In-memory store with switchable failures
#[derive(Default)]
pub struct InMemoryStore {
    pub modules: Vec<ModuleSummary>,
    pub progress: Vec<(Uuid, ProgressEntry)>,
    pub preferences: Option<(Uuid, LearningPreferences)>,
    pub fail_modules: bool,
    pub fail_progress: bool,
    pub fail_insert: bool,
    pub records: RwLock<Vec<RecommendationRecord>>,
}

impl InMemoryStore {
    pub fn with_catalog() -> Self {
        Self {
            modules: vec![module("a", ModuleLevel::Beginner), module("b", ModuleLevel::Intermediate)],
            ..Self::default()
        }
    }

    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn push_record(&self, record: RecommendationRecord) {
        self.records.write().await.push(record);
    }
}

pub fn module(id: &str, level: ModuleLevel) -> ModuleSummary {
    ModuleSummary {
        id: id.to_string(),
        title: format!("Module {}", id),
        description: Some(format!("About {}", id)),
        level,
        tags: Some(vec!["rust".to_string()]),
        estimated_minutes: Some(40),
    }
}

pub fn record(user_id: Uuid, created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> RecommendationRecord {
    RecommendationRecord {
        id: Uuid::new_v4(),
        user_id,
        suggested_module_ids: vec!["a".to_string()],
        reasoning: "1. x".to_string(),
        confidence_score: 0.5,
        created_at,
        expires_at,
    }
}

#[async_trait::async_trait]
impl LearningStore for InMemoryStore {
    async fn fetch_modules(&self) -> Result<Vec<ModuleSummary>, sqlx::Error> {
        if self.fail_modules {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self.modules.clone())
    }

    async fn fetch_recent_progress(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ProgressEntry>, sqlx::Error> {
        if self.fail_progress {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let mut entries: Vec<ProgressEntry> = self
            .progress
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, entry)| entry.clone())
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit as usize);
        Ok(entries)
    }

    async fn fetch_preferences(
        &self,
        user_id: Uuid,
    ) -> Result<Option<LearningPreferences>, sqlx::Error> {
        Ok(self
            .preferences
            .as_ref()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, prefs)| prefs.clone()))
    }

    async fn insert_recommendation(
        &self,
        recommendation: NewRecommendation,
    ) -> Result<RecommendationRecord, sqlx::Error> {
        if self.fail_insert {
            return Err(sqlx::Error::PoolClosed);
        }
        let created_at = Utc::now();
        let record = RecommendationRecord {
            id: Uuid::new_v4(),
            user_id: recommendation.user_id,
            suggested_module_ids: recommendation.suggested_module_ids,
            reasoning: recommendation.reasoning,
            confidence_score: recommendation.confidence_score,
            created_at,
            expires_at: created_at + chrono::Duration::days(RECOMMENDATION_TTL_DAYS),
        };
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn list_active_recommendations(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<RecommendationRecord>, sqlx::Error> {
        let mut active: Vec<RecommendationRecord> = self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.user_id == user_id && r.expires_at > now)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        active.truncate(limit as usize);
        Ok(active)
    }
}

pub fn settings(api_key: Option<&str>, timeout: Duration) -> GeneratorSettings {
    GeneratorSettings {
        api_key: api_key.map(str::to_string),
        model: "gpt-4o-mini".to_string(),
        temperature: 0.7,
        max_tokens: 1000,
        timeout,
    }
}

/// Everything a router test needs to inspect afterwards
pub struct Harness {
    pub server: TestServer,
    pub store: Arc<InMemoryStore>,
    pub provider: Arc<ScriptedProvider>,
    pub user_id: Uuid,
}

pub fn harness(store: InMemoryStore, script: Script) -> Harness {
    harness_with(
        Uuid::new_v4(),
        store,
        script,
        settings(Some(API_KEY), Duration::from_secs(5)),
    )
}

pub fn harness_with(
    user_id: Uuid,
    store: InMemoryStore,
    script: Script,
    settings: GeneratorSettings,
) -> Harness {
    let store = Arc::new(store);
    let provider = Arc::new(ScriptedProvider::new(script));

    let state = AppState::new(
        Arc::new(FakeIdentity { user_id }),
        store.clone(),
        provider.clone(),
        settings,
    );
    let server = TestServer::new(create_router(state)).unwrap();

    Harness {
        server,
        store,
        provider,
        user_id,
    }
}

use std::sync::Arc;

use crate::{
    config::Config,
    db::LearningStore,
    services::{
        CompletionProvider, GeneratorSettings, IdentityProvider, OpenAiProvider,
        RecommendationService, SupabaseIdentity,
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommendations: Arc<RecommendationService>,
}

impl AppState {
    /// Creates state from explicitly injected collaborators
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn LearningStore>,
        provider: Arc<dyn CompletionProvider>,
        settings: GeneratorSettings,
    ) -> Self {
        Self {
            recommendations: Arc::new(RecommendationService::new(
                identity, store, provider, settings,
            )),
        }
    }

    /// Wires the production identity service and language-model provider around `store`
    pub fn from_config(config: &Config, store: Arc<dyn LearningStore>) -> Self {
        let identity = SupabaseIdentity::new(
            config.supabase_url.clone(),
            config.supabase_service_role_key.clone(),
        );
        let provider = OpenAiProvider::new(config.openai_api_url.clone());

        Self::new(
            Arc::new(identity),
            store,
            Arc::new(provider),
            GeneratorSettings::from(config),
        )
    }
}

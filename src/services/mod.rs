pub mod auth;
pub mod prompt;
pub mod providers;
pub mod recommendations;

pub use auth::{IdentityProvider, SupabaseIdentity};
pub use providers::{CompletionProvider, OpenAiProvider};
pub use recommendations::{GeneratorSettings, RecommendationService};

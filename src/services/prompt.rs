use crate::{
    error::{AppError, AppResult},
    models::{ChatMessage, LearningPreferences, ModuleSummary, ProgressEntry},
};

/// Fixed instruction sent as the system turn
pub const SYSTEM_PROMPT: &str = r#"You are an adaptive learning coach. Study the learner's recent progress and preferences and suggest 3-5 learning modules from the catalog.

Respond with ONLY valid JSON in exactly this shape:
{
  "suggestions": [
    {
      "module_id": "<id from the catalog>",
      "reason": "Short explanation of why this module fits the learner",
      "confidence": 0.85
    }
  ]
}

When choosing:
- Build on completed modules and their scores
- Respect the learner's preferences for difficulty, pace and topics
- Follow a logical progression from fundamentals to advanced material
- Keep the suggestions varied
- Confidence is a decimal between 0 and 1"#;

/// Learning context assembled for one request
#[derive(Debug, Clone, Default)]
pub struct LearningContext {
    pub modules: Vec<ModuleSummary>,
    pub recent_progress: Vec<ProgressEntry>,
    pub preferences: LearningPreferences,
}

/// Serializes the context into the user turn
pub fn user_message(context: &LearningContext) -> AppResult<String> {
    let modules = to_pretty_json(&context.modules)?;
    let progress = to_pretty_json(&context.recent_progress)?;
    let preferences = to_pretty_json(&context.preferences)?;

    Ok(format!(
        "Available modules:\n{}\n\nLearner's recent progress:\n{}\n\nLearner preferences:\n{}\n\nProvide 3-5 personalized module recommendations.",
        modules, progress, preferences
    ))
}

/// System and user turns, in that order
pub fn build_messages(context: &LearningContext) -> AppResult<Vec<ChatMessage>> {
    Ok(vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(user_message(context)?),
    ])
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> AppResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Internal(format!("Failed to serialize prompt context: {}", e)))
}

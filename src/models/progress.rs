use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One engagement with a module, newest entries first when fetched
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct ProgressEntry {
    pub module_id: String,
    /// 0-100
    pub completion_score: i32,
    pub time_spent_minutes: i32,
    pub created_at: DateTime<Utc>,
}

/// Free-form learning preferences (difficulty bias, pace, favored topics, ...)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct LearningPreferences(pub Map<String, Value>);

impl LearningPreferences {
    /// Preferences stored as anything other than a JSON object are treated as empty
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_preferences_from_object() {
        let prefs = LearningPreferences::from_value(json!({ "pace": "fast", "topics": ["rust"] }));
        assert_eq!(prefs.0.len(), 2);
        assert_eq!(prefs.0["pace"], "fast");
    }

    #[test]
    fn test_preferences_from_non_object_is_empty() {
        assert!(LearningPreferences::from_value(json!(null)).0.is_empty());
        assert!(LearningPreferences::from_value(json!(["fast"])).0.is_empty());
    }

    #[test]
    fn test_preferences_serialize_transparently() {
        let prefs = LearningPreferences::from_value(json!({ "difficulty": "hard" }));
        assert_eq!(serde_json::to_value(&prefs).unwrap(), json!({ "difficulty": "hard" }));
    }
}

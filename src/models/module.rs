use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Display;

/// Difficulty level of a learning module
///
/// Levels outside the known set are kept as stored so the catalog reaches the model intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleLevel {
    Beginner,
    Intermediate,
    Advanced,
    Other(String),
}

impl ModuleLevel {
    pub fn is_known(&self) -> bool {
        !matches!(self, ModuleLevel::Other(_))
    }
}

impl From<&str> for ModuleLevel {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "beginner" => ModuleLevel::Beginner,
            "intermediate" => ModuleLevel::Intermediate,
            "advanced" => ModuleLevel::Advanced,
            _ => ModuleLevel::Other(s.to_string()),
        }
    }
}

impl Display for ModuleLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self {
            ModuleLevel::Beginner => "beginner",
            ModuleLevel::Intermediate => "intermediate",
            ModuleLevel::Advanced => "advanced",
            ModuleLevel::Other(level) => level.as_str(),
        };
        write!(f, "{}", level)
    }
}

impl Serialize for ModuleLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ModuleLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let level = String::deserialize(deserializer)?;
        Ok(ModuleLevel::from(level.as_str()))
    }
}

/// Catalog entry the model reasons over
///
/// Serialized with the `learning_modules` column names. The catalog is owned elsewhere;
/// this service only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleSummary {
    /// Opaque, stable module identifier
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub level: ModuleLevel,
    #[serde(rename = "ai_tags")]
    pub tags: Option<Vec<String>>,
    #[serde(rename = "estimated_time_minutes")]
    pub estimated_minutes: Option<i32>,
}

/// Raw `learning_modules` row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ModuleRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub level: String,
    pub ai_tags: Option<Vec<String>>,
    pub estimated_time_minutes: Option<i32>,
}

impl From<ModuleRow> for ModuleSummary {
    fn from(row: ModuleRow) -> Self {
        ModuleSummary {
            level: ModuleLevel::from(row.level.as_str()),
            id: row.id,
            title: row.title,
            description: row.description,
            tags: row.ai_tags,
            estimated_minutes: row.estimated_time_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(level: &str) -> ModuleRow {
        ModuleRow {
            id: "m-1".to_string(),
            title: "Ownership".to_string(),
            description: None,
            level: level.to_string(),
            ai_tags: Some(vec!["rust".to_string()]),
            estimated_time_minutes: Some(45),
        }
    }

    #[test]
    fn test_level_parsing_is_case_insensitive() {
        assert_eq!(ModuleLevel::from("Beginner"), ModuleLevel::Beginner);
        assert_eq!(ModuleLevel::from(" advanced "), ModuleLevel::Advanced);
        assert!(!ModuleLevel::from("expert").is_known());
    }

    #[test]
    fn test_unknown_level_is_kept_as_stored() {
        let summary = ModuleSummary::from(row("Guru"));
        assert_eq!(summary.level, ModuleLevel::Other("Guru".to_string()));
        assert_eq!(serde_json::to_value(&summary.level).unwrap(), "Guru");
    }

    #[test]
    fn test_summary_serializes_with_column_names() {
        let json = serde_json::to_value(ModuleSummary::from(row("intermediate"))).unwrap();
        assert_eq!(
            json,
            json!({
                "id": "m-1",
                "title": "Ownership",
                "description": null,
                "level": "intermediate",
                "ai_tags": ["rust"],
                "estimated_time_minutes": 45
            })
        );
    }

    #[test]
    fn test_level_round_trips_through_serde() {
        let level: ModuleLevel = serde_json::from_value(json!("advanced")).unwrap();
        assert_eq!(level, ModuleLevel::Advanced);
        assert_eq!(ModuleLevel::Advanced.to_string(), "advanced");
    }
}

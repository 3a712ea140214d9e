use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::duration;
use crate::error::YummyError;

/// Identity and bookkeeping columns shared by every table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Base {
    pub id: i64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipe {
    pub base: Base,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeMetadata {
    pub base: Base,
    pub recipe_id: i64,
    pub description: String,
    pub author: String,
    #[serde(serialize_with = "duration::serialize")]
    pub cook_time: TimeDelta,
    #[serde(serialize_with = "duration::serialize")]
    pub prep_time: TimeDelta,
    #[serde(serialize_with = "duration::serialize")]
    pub total_time: TimeDelta,
    pub quantity: String,
    pub url: String,
    pub favourite: bool,
    pub rating: u8,
}

/// One structured ingredient line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ingredient {
    pub amount: String,
    pub unit: String,
    pub name: String,
    pub details: String,
}

impl Ingredient {
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// A fully assembled recipe: the recipe row, its metadata and every child
/// collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecipeRaw {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub author: String,
    #[serde(serialize_with = "duration::serialize")]
    pub cook_time: TimeDelta,
    #[serde(serialize_with = "duration::serialize")]
    pub prep_time: TimeDelta,
    #[serde(serialize_with = "duration::serialize")]
    pub total_time: TimeDelta,
    /// Serving size, free text.
    pub quantity: String,
    pub url: String,
    pub favourite: bool,
    pub rating: u8,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl RecipeRaw {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// Row returned by the recipe listing: metadata plus categories, no child
/// collections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub author: String,
    #[serde(serialize_with = "duration::serialize")]
    pub cook_time: TimeDelta,
    #[serde(serialize_with = "duration::serialize")]
    pub prep_time: TimeDelta,
    #[serde(serialize_with = "duration::serialize")]
    pub total_time: TimeDelta,
    pub quantity: String,
    pub url: String,
    pub favourite: bool,
    pub rating: u8,
    pub categories: Vec<String>,
}

pub const MAX_RATING: u8 = 5;

pub fn validate_rating(rating: u8) -> Result<(), YummyError> {
    if rating > MAX_RATING {
        return Err(YummyError::Validation(format!(
            "rating must be between 0 and {MAX_RATING} (got {rating})"
        )));
    }
    Ok(())
}

/// Checks that must hold before a recipe reaches the store.
pub fn validate_recipe(recipe: &RecipeRaw) -> Result<(), YummyError> {
    if recipe.name.trim().is_empty() {
        return Err(YummyError::Validation("recipe name is required".to_string()));
    }
    validate_rating(recipe.rating)
}

// --- Chat sessions ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    Human,
    Ai,
    Tool,
}

impl MessageRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Human => "human",
            Self::Ai => "ai",
            Self::Tool => "tool",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageRole {
    type Err = YummyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(Self::System),
            "human" | "user" => Ok(Self::Human),
            "ai" | "assistant" => Ok(Self::Ai),
            "tool" => Ok(Self::Tool),
            other => Err(YummyError::Parse(format!("message role '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub base: Base,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionMessage {
    pub base: Base,
    pub session_id: i64,
    pub message: String,
    pub role: MessageRole,
    pub model_name: String,
    pub content: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_tokens: i64,
}

#[derive(Debug, Clone)]
pub struct NewSessionMessage {
    pub message: String,
    pub role: MessageRole,
    pub model_name: String,
    pub content: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_tokens: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub session_id: i64,
    pub message_count: i64,
    pub total_input_tokens: i64,
    pub total_output_tokens: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_recipe_requires_name() {
        assert!(validate_recipe(&RecipeRaw::new("  ")).is_err());
        assert!(validate_recipe(&RecipeRaw::new("Soup")).is_ok());
    }

    #[test]
    fn test_validate_rating_bounds() {
        assert!(validate_rating(0).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(matches!(
            validate_rating(6),
            Err(YummyError::Validation(_))
        ));
    }

    #[test]
    fn test_message_role_parse() {
        assert_eq!("assistant".parse::<MessageRole>().unwrap(), MessageRole::Ai);
        assert_eq!("Human".parse::<MessageRole>().unwrap(), MessageRole::Human);
        assert!("robot".parse::<MessageRole>().is_err());
        assert_eq!(MessageRole::Tool.to_string(), "tool");
    }

    #[test]
    fn test_recipe_raw_json_uses_duration_strings() {
        let mut recipe = RecipeRaw::new("Stew");
        recipe.total_time = TimeDelta::minutes(90);
        let json = serde_json::to_value(&recipe).unwrap();
        assert_eq!(json["total_time"], "1h30m0s");
        assert_eq!(json["cook_time"], "0s");
        assert!(json.get("id").is_none());
    }
}

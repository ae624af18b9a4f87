// ABOUTME: Data model for recipe generation: requirements, skeleton, nutrition lookups and persisted recipes
// ABOUTME: Strict serde shapes double as the schema the LLM output is decoded against
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::errors::{AppError, AppResult};

// ============================================================================
// Requirements
// ============================================================================

/// Caller-supplied constraints for one generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRequirements {
    /// Breakfast, lunch, dinner, snack, ...
    pub meal_type: String,
    /// Korean, Italian, ...
    pub cuisine_type: String,
    /// Diets the recipe must satisfy
    #[serde(default)]
    pub dietary_restrictions: BTreeSet<String>,
    /// Allergens to exclude
    #[serde(default)]
    pub allergies: BTreeSet<String>,
    /// Number of servings, at least 1
    pub servings: u32,
    /// Upper bound on calories per serving
    #[serde(default)]
    pub calorie_limit: Option<u32>,
    /// Ingredients the recipe must use, in the order given
    #[serde(default, rename = "ingredients")]
    pub required_ingredients: Vec<String>,
    /// Free-form extra preferences passed through to the prompt
    #[serde(default)]
    pub additional_preferences: Map<String, Value>,
}

impl RecipeRequirements {
    /// Reject requirements the pipeline cannot work with
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` for empty meal or cuisine types, zero servings
    /// or a zero calorie limit.
    pub fn validate(&self) -> AppResult<()> {
        if self.meal_type.trim().is_empty() {
            return Err(AppError::invalid_input("meal_type is required"));
        }
        if self.cuisine_type.trim().is_empty() {
            return Err(AppError::invalid_input("cuisine_type is required"));
        }
        if self.servings == 0 {
            return Err(AppError::invalid_input("servings must be at least 1"));
        }
        if self.calorie_limit == Some(0) {
            return Err(AppError::invalid_input(
                "calorie_limit must be a positive number",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Skeleton
// ============================================================================

/// Recipe content produced by the first LLM call, before nutrition is attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSkeleton {
    /// Recipe title
    pub title: String,
    /// Short summary
    pub description: String,
    /// "name: quantity unit" lines
    pub ingredients: Vec<String>,
    /// Ordered steps
    pub instructions: Vec<String>,
    /// Total cooking time as given by the model
    #[serde(deserialize_with = "string_or_number")]
    pub cooking_time: String,
    /// Difficulty label
    pub skill_level: String,
}

/// Accept `"30 minutes"` as well as a bare `30`
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(value) => value,
        StringOrNumber::Number(value) => value.to_string(),
    })
}

// ============================================================================
// Nutrition
// ============================================================================

/// Macro values of one serving variant as reported by the nutrition database
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroValues {
    /// kcal
    pub calories: f64,
    /// grams
    pub protein: f64,
    /// grams
    pub carbs: f64,
    /// grams
    pub fat: f64,
    /// Fiber (g)
    pub fiber: Option<f64>,
    /// Sugar (g)
    pub sugar: Option<f64>,
    /// milligrams
    pub sodium: Option<f64>,
}

/// Reference quantity the macro values of a lookup refer to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "description", rename_all = "snake_case")]
pub enum ServingBasis {
    /// Normalised to 100 grams
    Per100g,
    /// Some other serving, e.g. "1 cup"; values are not rescaled
    Serving(String),
}

impl fmt::Display for ServingBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Per100g => write!(f, "per 100 g"),
            Self::Serving(description) => write!(f, "per serving \"{description}\""),
        }
    }
}

/// Nutrition data resolved for one skeleton ingredient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientNutritionLookup {
    /// Name parsed from the ingredient line
    pub ingredient: String,
    /// Remainder of the line after the colon, e.g. "200 grams"
    pub quantity: String,
    /// Matched nutrition database id
    pub food_id: String,
    /// Matched food name
    pub food_name: String,
    /// Serving the macros were read from
    pub basis: ServingBasis,
    /// Macro values for that serving
    pub macros: MacroValues,
}

/// Per-serving nutrition computed by the second LLM call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateNutritionFacts {
    /// Calories (kcal)
    pub calories: f64,
    /// Protein (g)
    pub protein: f64,
    /// Carbohydrate (g)
    pub carbs: f64,
    /// Fat (g)
    pub fat: f64,
    /// Fiber (g)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
    /// Sugar (g)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar: Option<f64>,
    /// Sodium (mg)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium: Option<f64>,
}

/// Shape the aggregate prompt asks the model to answer with
#[derive(Debug, Deserialize)]
pub struct NutritionFactsEnvelope {
    /// Per-serving nutrition
    #[serde(rename = "nutritionFacts")]
    pub nutrition_facts: AggregateNutritionFacts,
}

// ============================================================================
// Persistence
// ============================================================================

/// Merged record handed to storage at the end of a run
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    /// Owning user id
    pub user_id: String,
    /// Constraints the recipe was generated from
    pub requirements: RecipeRequirements,
    /// Generated recipe body
    pub skeleton: RecipeSkeleton,
    /// Per-serving nutrition
    pub nutrition_facts: AggregateNutritionFacts,
}

/// Stored recipe as returned to API clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecipe {
    /// Generated id
    pub id: String,
    /// Owning user id
    pub user_id: String,
    /// Recipe title
    pub title: String,
    /// Short summary
    pub description: String,
    /// Ingredient names
    pub ingredients: Vec<String>,
    /// Ordered steps
    pub instructions: Vec<String>,
    /// Total cooking time as given by the model
    pub cooking_time: String,
    /// Difficulty label
    pub skill_level: String,
    /// Per-serving nutrition
    pub nutrition_facts: AggregateNutritionFacts,
    /// Meal type, e.g. dinner
    pub meal_type: String,
    /// Cuisine
    pub cuisine_type: String,
    /// Diets the recipe must satisfy
    pub dietary_restrictions: BTreeSet<String>,
    /// Allergens to exclude
    pub allergies: BTreeSet<String>,
    /// Number of servings
    pub servings: u32,
    /// Per-serving calorie cap
    pub calorie_limit: Option<u32>,
    /// Ingredients the caller asked for
    pub required_ingredients: Vec<String>,
    /// Any further caller preferences
    pub additional_preferences: Map<String, Value>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl PersistedRecipe {
    /// Combine a merged record with storage-assigned identity and timestamps
    #[must_use]
    pub fn from_new(recipe: NewRecipe, id: String, created_at: DateTime<Utc>) -> Self {
        let NewRecipe {
            user_id,
            requirements,
            skeleton,
            nutrition_facts,
        } = recipe;

        Self {
            id,
            user_id,
            title: skeleton.title,
            description: skeleton.description,
            ingredients: skeleton.ingredients,
            instructions: skeleton.instructions,
            cooking_time: skeleton.cooking_time,
            skill_level: skeleton.skill_level,
            nutrition_facts,
            meal_type: requirements.meal_type,
            cuisine_type: requirements.cuisine_type,
            dietary_restrictions: requirements.dietary_restrictions,
            allergies: requirements.allergies,
            servings: requirements.servings,
            calorie_limit: requirements.calorie_limit,
            required_ingredients: requirements.required_ingredients,
            additional_preferences: requirements.additional_preferences,
            created_at,
            updated_at: created_at,
        }
    }
}

/// Storage collaborator for generated recipes
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Persist a merged recipe and return it with id and timestamps
    async fn create_recipe(&self, recipe: NewRecipe) -> AppResult<PersistedRecipe>;
}

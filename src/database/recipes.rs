// ABOUTME: Recipe storage: generated recipes, per-user bookmarks, search and feedback
// ABOUTME: Implements RecipeStore so the generation pipeline can persist through it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{execute_ddl, parse_timestamp};
use crate::errors::{AppError, AppResult};
use crate::recipes::{NewRecipe, PersistedRecipe, RecipeStore};

/// Maximum number of search results returned
const SEARCH_LIMIT: i64 = 50;

const RECIPE_COLUMNS: &str = "r.id, r.user_id, r.title, r.description, r.ingredients, \
    r.instructions, r.cooking_time, r.skill_level, r.nutrition_facts, r.meal_type, \
    r.cuisine_type, r.dietary_restrictions, r.allergies, r.servings, r.calorie_limit, \
    r.required_ingredients, r.additional_preferences, r.created_at, r.updated_at";

/// Search parameters; empty strings are ignored
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeSearchFilters {
    /// Substring matched against title and description
    #[serde(default)]
    pub query: Option<String>,
    /// Exact cuisine, case-insensitive
    #[serde(default, rename = "cuisineType")]
    pub cuisine_type: Option<String>,
    /// Exact meal type, case-insensitive
    #[serde(default, rename = "mealType")]
    pub meal_type: Option<String>,
}

/// Search hit with its average feedback rating
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSearchResult {
    /// Matched recipe
    #[serde(flatten)]
    pub recipe: PersistedRecipe,
    /// `None` until the recipe has feedback
    pub average_rating: Option<f64>,
}

/// Feedback submitted for a recipe
#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipeFeedback {
    /// Rated recipe
    pub recipe_id: String,
    /// 1 to 5; anything else is rejected with `INVALID_INPUT`
    pub rating: i64,
    /// Free-text remarks
    #[serde(default)]
    pub comments: Option<String>,
    /// Problems the user ran into
    #[serde(default)]
    pub issues: Vec<String>,
}

/// Stored feedback entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeFeedback {
    /// Generated id
    pub feedback_id: String,
    /// Rated recipe
    pub recipe_id: String,
    /// Author
    pub user_id: String,
    /// 1 to 5
    pub rating: u8,
    /// Free-text remarks
    pub comments: Option<String>,
    /// Problems the user ran into
    pub issues: Vec<String>,
    /// Submission time
    pub created_at: DateTime<Utc>,
}

/// Recipe, bookmark and feedback queries
#[derive(Clone)]
pub struct RecipesManager {
    pool: SqlitePool,
}

impl RecipesManager {
    /// Create a new manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub(super) async fn migrate(&self) -> AppResult<()> {
        execute_ddl(
            &self.pool,
            r"
            CREATE TABLE IF NOT EXISTS recipes (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                ingredients TEXT NOT NULL,
                instructions TEXT NOT NULL,
                cooking_time TEXT NOT NULL,
                skill_level TEXT NOT NULL,
                nutrition_facts TEXT NOT NULL,
                meal_type TEXT NOT NULL,
                cuisine_type TEXT NOT NULL,
                dietary_restrictions TEXT NOT NULL DEFAULT '[]',
                allergies TEXT NOT NULL DEFAULT '[]',
                servings INTEGER NOT NULL CHECK (servings > 0),
                calorie_limit INTEGER,
                required_ingredients TEXT NOT NULL DEFAULT '[]',
                additional_preferences TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            "recipes table",
        )
        .await?;

        execute_ddl(
            &self.pool,
            "CREATE INDEX IF NOT EXISTS idx_recipes_user_id ON recipes(user_id)",
            "recipes index",
        )
        .await?;

        execute_ddl(
            &self.pool,
            r"
            CREATE TABLE IF NOT EXISTS saved_recipes (
                user_id TEXT NOT NULL,
                recipe_id TEXT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                saved_at TEXT NOT NULL,
                PRIMARY KEY (user_id, recipe_id)
            )
            ",
            "saved_recipes table",
        )
        .await?;

        execute_ddl(
            &self.pool,
            r"
            CREATE TABLE IF NOT EXISTS recipe_feedback (
                id TEXT PRIMARY KEY,
                recipe_id TEXT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL,
                rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                comments TEXT,
                issues TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL
            )
            ",
            "recipe_feedback table",
        )
        .await?;

        execute_ddl(
            &self.pool,
            "CREATE INDEX IF NOT EXISTS idx_recipe_feedback_recipe_id ON recipe_feedback(recipe_id)",
            "recipe_feedback index",
        )
        .await
    }

    /// Fetch a recipe by id
    ///
    /// # Errors
    ///
    /// Returns `DATABASE_ERROR` if the query fails or a stored column is corrupt.
    pub async fn get_recipe(&self, recipe_id: &str) -> AppResult<Option<PersistedRecipe>> {
        let row = sqlx::query(&format!("SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.id = $1"))
            .bind(recipe_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get recipe: {e}")))?;

        row.as_ref().map(row_to_recipe).transpose()
    }

    /// Bookmark a recipe for a user; saving twice is a no-op
    ///
    /// # Errors
    ///
    /// `RESOURCE_NOT_FOUND` if the recipe does not exist, `DATABASE_ERROR` if
    /// the write fails.
    pub async fn save_recipe(&self, user_id: &str, recipe_id: &str) -> AppResult<()> {
        if self.get_recipe(recipe_id).await?.is_none() {
            return Err(AppError::not_found(format!("Recipe {recipe_id}")));
        }

        sqlx::query(
            r"
            INSERT OR IGNORE INTO saved_recipes (user_id, recipe_id, saved_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(user_id)
        .bind(recipe_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save recipe: {e}")))?;

        Ok(())
    }

    /// Recipes bookmarked by a user, most recently saved first
    ///
    /// # Errors
    ///
    /// Returns `DATABASE_ERROR` if the query fails.
    pub async fn list_saved(&self, user_id: &str) -> AppResult<Vec<PersistedRecipe>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {RECIPE_COLUMNS}
            FROM saved_recipes s
            JOIN recipes r ON r.id = s.recipe_id
            WHERE s.user_id = $1
            ORDER BY s.saved_at DESC, r.title ASC
            "
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list saved recipes: {e}")))?;

        rows.iter().map(row_to_recipe).collect()
    }

    /// Search titles and descriptions, optionally filtered by cuisine and meal type
    ///
    /// # Errors
    ///
    /// Returns `DATABASE_ERROR` if the query fails.
    pub async fn search(&self, filters: &RecipeSearchFilters) -> AppResult<Vec<RecipeSearchResult>> {
        fn non_empty(value: Option<&String>) -> Option<&str> {
            value.map(|v| v.trim()).filter(|v| !v.is_empty())
        }

        let pattern = non_empty(filters.query.as_ref()).map(like_pattern);

        let rows = sqlx::query(&format!(
            r"
            SELECT {RECIPE_COLUMNS}, AVG(f.rating) AS average_rating
            FROM recipes r
            LEFT JOIN recipe_feedback f ON f.recipe_id = r.id
            WHERE ($1 IS NULL OR r.title LIKE $1 ESCAPE '\' OR r.description LIKE $1 ESCAPE '\')
              AND ($2 IS NULL OR r.cuisine_type = $2 COLLATE NOCASE)
              AND ($3 IS NULL OR r.meal_type = $3 COLLATE NOCASE)
            GROUP BY r.id
            ORDER BY r.created_at DESC
            LIMIT $4
            "
        ))
        .bind(pattern)
        .bind(non_empty(filters.cuisine_type.as_ref()))
        .bind(non_empty(filters.meal_type.as_ref()))
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to search recipes: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(RecipeSearchResult {
                    recipe: row_to_recipe(row)?,
                    average_rating: row.get("average_rating"),
                })
            })
            .collect()
    }

    /// Store feedback from a user
    ///
    /// # Errors
    ///
    /// `INVALID_INPUT` for a rating outside 1..=5, `RESOURCE_NOT_FOUND` if the
    /// recipe does not exist, `DATABASE_ERROR` if the write fails.
    pub async fn add_feedback(
        &self,
        user_id: &str,
        feedback: &NewRecipeFeedback,
    ) -> AppResult<RecipeFeedback> {
        let rating = u8::try_from(feedback.rating)
            .ok()
            .filter(|rating| (1..=5).contains(rating))
            .ok_or_else(|| AppError::invalid_input("rating must be between 1 and 5"))?;
        if self.get_recipe(&feedback.recipe_id).await?.is_none() {
            return Err(AppError::not_found(format!("Recipe {}", feedback.recipe_id)));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let issues_json = serde_json::to_string(&feedback.issues)?;

        sqlx::query(
            r"
            INSERT INTO recipe_feedback (id, recipe_id, user_id, rating, comments, issues, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(&id)
        .bind(&feedback.recipe_id)
        .bind(user_id)
        .bind(i64::from(rating))
        .bind(feedback.comments.as_deref())
        .bind(&issues_json)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save feedback: {e}")))?;

        Ok(RecipeFeedback {
            feedback_id: id,
            recipe_id: feedback.recipe_id.clone(),
            user_id: user_id.to_owned(),
            rating,
            comments: feedback.comments.clone(),
            issues: feedback.issues.clone(),
            created_at: now,
        })
    }
}

#[async_trait]
impl RecipeStore for RecipesManager {
    async fn create_recipe(&self, recipe: NewRecipe) -> AppResult<PersistedRecipe> {
        let recipe = PersistedRecipe::from_new(recipe, Uuid::new_v4().to_string(), Utc::now());

        sqlx::query(
            r"
            INSERT INTO recipes (
                id, user_id, title, description, ingredients, instructions, cooking_time,
                skill_level, nutrition_facts, meal_type, cuisine_type, dietary_restrictions,
                allergies, servings, calorie_limit, required_ingredients, additional_preferences,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $18)
            ",
        )
        .bind(&recipe.id)
        .bind(&recipe.user_id)
        .bind(&recipe.title)
        .bind(&recipe.description)
        .bind(serde_json::to_string(&recipe.ingredients)?)
        .bind(serde_json::to_string(&recipe.instructions)?)
        .bind(&recipe.cooking_time)
        .bind(&recipe.skill_level)
        .bind(serde_json::to_string(&recipe.nutrition_facts)?)
        .bind(&recipe.meal_type)
        .bind(&recipe.cuisine_type)
        .bind(serde_json::to_string(&recipe.dietary_restrictions)?)
        .bind(serde_json::to_string(&recipe.allergies)?)
        .bind(i64::from(recipe.servings))
        .bind(recipe.calorie_limit.map(i64::from))
        .bind(serde_json::to_string(&recipe.required_ingredients)?)
        .bind(serde_json::to_string(&recipe.additional_preferences)?)
        .bind(recipe.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create recipe: {e}")))?;

        Ok(recipe)
    }
}

/// Wrap a search term for `LIKE ... ESCAPE '\'` so `%` and `_` match literally
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Decode a JSON text column
fn json_column<T: DeserializeOwned>(row: &SqliteRow, column: &str) -> AppResult<T> {
    let text: String = row.get(column);
    Ok(serde_json::from_str(&text)?)
}

fn row_to_recipe(row: &SqliteRow) -> AppResult<PersistedRecipe> {
    let servings: i64 = row.get("servings");
    let calorie_limit: Option<i64> = row.get("calorie_limit");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(PersistedRecipe {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        description: row.get("description"),
        ingredients: json_column(row, "ingredients")?,
        instructions: json_column(row, "instructions")?,
        cooking_time: row.get("cooking_time"),
        skill_level: row.get("skill_level"),
        nutrition_facts: json_column(row, "nutrition_facts")?,
        meal_type: row.get("meal_type"),
        cuisine_type: row.get("cuisine_type"),
        dietary_restrictions: json_column(row, "dietary_restrictions")?,
        allergies: json_column(row, "allergies")?,
        servings: u32::try_from(servings)
            .map_err(|e| AppError::internal(format!("Invalid servings value: {e}")))?,
        calorie_limit: calorie_limit
            .map(u32::try_from)
            .transpose()
            .map_err(|e| AppError::internal(format!("Invalid calorie limit: {e}")))?,
        required_ingredients: json_column(row, "required_ingredients")?,
        additional_preferences: json_column(row, "additional_preferences")?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

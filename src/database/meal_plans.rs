// ABOUTME: Meal plan storage with per-user ownership checks
// ABOUTME: Create, fetch, partial update and delete of date-ranged plans
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::{execute_ddl, parse_timestamp};
use crate::errors::{AppError, AppResult};

/// Meal plan creation request
#[derive(Debug, Clone, Deserialize)]
pub struct NewMealPlan {
    /// First day of the plan
    pub start_date: NaiveDate,
    /// Last day of the plan, inclusive
    pub end_date: NaiveDate,
    /// Free-form preferences
    #[serde(default)]
    pub preferences: Map<String, Value>,
    /// Ingredients to avoid
    #[serde(default)]
    pub exclude_ingredients: Vec<String>,
    /// Recipe ids to include
    #[serde(default)]
    pub include_recipes: Vec<String>,
}

/// Fields to change on an existing plan; absent fields are kept
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MealPlanUpdate {
    /// First day of the plan
    pub start_date: Option<NaiveDate>,
    /// Last day of the plan, inclusive
    pub end_date: Option<NaiveDate>,
    /// Free-form preferences
    pub preferences: Option<Map<String, Value>>,
    /// Ingredients to avoid
    pub exclude_ingredients: Option<Vec<String>>,
    /// Recipe ids to include
    pub include_recipes: Option<Vec<String>>,
}

/// Stored meal plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealPlan {
    /// Generated id
    pub meal_plan_id: String,
    /// Owning user id
    pub user_id: String,
    /// First day of the plan
    pub start_date: NaiveDate,
    /// Last day of the plan, inclusive
    pub end_date: NaiveDate,
    /// Free-form preferences
    pub preferences: Map<String, Value>,
    /// Ingredients to avoid
    pub exclude_ingredients: Vec<String>,
    /// Recipe ids to include
    pub include_recipes: Vec<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

fn check_date_range(start: NaiveDate, end: NaiveDate) -> AppResult<()> {
    if end < start {
        return Err(AppError::invalid_input(
            "end_date must not be before start_date",
        ));
    }
    Ok(())
}

/// Meal plan queries
#[derive(Clone)]
pub struct MealPlansManager {
    pool: SqlitePool,
}

impl MealPlansManager {
    /// Create a new manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub(super) async fn migrate(&self) -> AppResult<()> {
        execute_ddl(
            &self.pool,
            r"
            CREATE TABLE IF NOT EXISTS meal_plans (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                preferences TEXT NOT NULL DEFAULT '{}',
                exclude_ingredients TEXT NOT NULL DEFAULT '[]',
                include_recipes TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            "meal_plans table",
        )
        .await?;

        execute_ddl(
            &self.pool,
            "CREATE INDEX IF NOT EXISTS idx_meal_plans_user_id ON meal_plans(user_id)",
            "meal_plans index",
        )
        .await
    }

    /// Create a plan owned by `user_id`
    ///
    /// # Errors
    ///
    /// `INVALID_INPUT` if the end date precedes the start date,
    /// `DATABASE_ERROR` if the write fails.
    pub async fn create(&self, user_id: &str, plan: &NewMealPlan) -> AppResult<MealPlan> {
        check_date_range(plan.start_date, plan.end_date)?;

        let now = Utc::now();
        let meal_plan = MealPlan {
            meal_plan_id: Uuid::new_v4().to_string(),
            user_id: user_id.to_owned(),
            start_date: plan.start_date,
            end_date: plan.end_date,
            preferences: plan.preferences.clone(),
            exclude_ingredients: plan.exclude_ingredients.clone(),
            include_recipes: plan.include_recipes.clone(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r"
            INSERT INTO meal_plans (
                id, user_id, start_date, end_date, preferences,
                exclude_ingredients, include_recipes, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            ",
        )
        .bind(&meal_plan.meal_plan_id)
        .bind(user_id)
        .bind(meal_plan.start_date.to_string())
        .bind(meal_plan.end_date.to_string())
        .bind(serde_json::to_string(&meal_plan.preferences)?)
        .bind(serde_json::to_string(&meal_plan.exclude_ingredients)?)
        .bind(serde_json::to_string(&meal_plan.include_recipes)?)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create meal plan: {e}")))?;

        Ok(meal_plan)
    }

    /// Fetch a plan if it exists and belongs to `user_id`
    ///
    /// # Errors
    ///
    /// Returns `DATABASE_ERROR` if the query fails.
    pub async fn get(&self, user_id: &str, meal_plan_id: &str) -> AppResult<Option<MealPlan>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, start_date, end_date, preferences,
                   exclude_ingredients, include_recipes, created_at, updated_at
            FROM meal_plans
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(meal_plan_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get meal plan: {e}")))?;

        row.as_ref().map(row_to_meal_plan).transpose()
    }

    /// Apply `updates` to a plan owned by `user_id`
    ///
    /// Returns `None` if no such plan exists for the user.
    ///
    /// # Errors
    ///
    /// `INVALID_INPUT` if the resulting date range is inverted,
    /// `DATABASE_ERROR` if the write fails.
    pub async fn update(
        &self,
        user_id: &str,
        meal_plan_id: &str,
        updates: MealPlanUpdate,
    ) -> AppResult<Option<MealPlan>> {
        let Some(mut plan) = self.get(user_id, meal_plan_id).await? else {
            return Ok(None);
        };

        if let Some(start_date) = updates.start_date {
            plan.start_date = start_date;
        }
        if let Some(end_date) = updates.end_date {
            plan.end_date = end_date;
        }
        if let Some(preferences) = updates.preferences {
            plan.preferences = preferences;
        }
        if let Some(exclude_ingredients) = updates.exclude_ingredients {
            plan.exclude_ingredients = exclude_ingredients;
        }
        if let Some(include_recipes) = updates.include_recipes {
            plan.include_recipes = include_recipes;
        }
        check_date_range(plan.start_date, plan.end_date)?;
        plan.updated_at = Utc::now();

        sqlx::query(
            r"
            UPDATE meal_plans
            SET start_date = $1, end_date = $2, preferences = $3,
                exclude_ingredients = $4, include_recipes = $5, updated_at = $6
            WHERE id = $7 AND user_id = $8
            ",
        )
        .bind(plan.start_date.to_string())
        .bind(plan.end_date.to_string())
        .bind(serde_json::to_string(&plan.preferences)?)
        .bind(serde_json::to_string(&plan.exclude_ingredients)?)
        .bind(serde_json::to_string(&plan.include_recipes)?)
        .bind(plan.updated_at.to_rfc3339())
        .bind(meal_plan_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update meal plan: {e}")))?;

        Ok(Some(plan))
    }

    /// Delete a plan owned by `user_id`; returns whether a row was removed
    ///
    /// # Errors
    ///
    /// Returns `DATABASE_ERROR` if the statement fails.
    pub async fn delete(&self, user_id: &str, meal_plan_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM meal_plans WHERE id = $1 AND user_id = $2")
            .bind(meal_plan_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete meal plan: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}

fn parse_date(value: &str) -> AppResult<NaiveDate> {
    value
        .parse()
        .map_err(|e| AppError::internal(format!("Invalid date: {e}")))
}

fn row_to_meal_plan(row: &SqliteRow) -> AppResult<MealPlan> {
    let start_date: String = row.get("start_date");
    let end_date: String = row.get("end_date");
    let preferences: String = row.get("preferences");
    let exclude_ingredients: String = row.get("exclude_ingredients");
    let include_recipes: String = row.get("include_recipes");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(MealPlan {
        meal_plan_id: row.get("id"),
        user_id: row.get("user_id"),
        start_date: parse_date(&start_date)?,
        end_date: parse_date(&end_date)?,
        preferences: serde_json::from_str(&preferences)?,
        exclude_ingredients: serde_json::from_str(&exclude_ingredients)?,
        include_recipes: serde_json::from_str(&include_recipes)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

// ABOUTME: SQLite storage for user profiles, recipes, bookmarks, feedback and meal plans
// ABOUTME: Owns the connection pool and schema creation; per-table managers hold the queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database Management
//!
//! Runtime-checked `sqlx` queries against `SQLite`. List and map fields are
//! stored as JSON text, ids are UUID v4 strings (user ids are the identity
//! provider's uid), timestamps are RFC 3339 UTC.

mod meal_plans;
mod recipes;
mod users;

pub use meal_plans::{MealPlan, MealPlanUpdate, MealPlansManager, NewMealPlan};
pub use recipes::{
    NewRecipeFeedback, RecipeFeedback, RecipeSearchFilters, RecipeSearchResult, RecipesManager,
};
pub use users::{UserProfile, UsersManager};

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::errors::{AppError, AppResult};

/// Pool size for file-backed databases
const MAX_CONNECTIONS: u32 = 5;

/// Database handle shared by all routes
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to `database_url`, creating the file if needed, and create the schema
    ///
    /// `sqlite::memory:` databases use a single long-lived connection so every
    /// query sees the same data.
    ///
    /// # Errors
    ///
    /// Returns `DATABASE_ERROR` if the URL is invalid, the connection fails or
    /// schema creation fails.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::database(format!("Invalid database URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        let is_memory = database_url.contains(":memory:");
        let pool_options = if is_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;

        info!(in_memory = is_memory, "Database ready");
        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create all tables and indexes
    ///
    /// # Errors
    ///
    /// Returns `DATABASE_ERROR` if a statement fails.
    pub async fn migrate(&self) -> AppResult<()> {
        self.users().migrate().await?;
        self.recipes().migrate().await?;
        self.meal_plans().migrate().await?;
        Ok(())
    }

    /// User profile queries
    #[must_use]
    pub fn users(&self) -> UsersManager {
        UsersManager::new(self.pool.clone())
    }

    /// Recipe, bookmark and feedback queries
    #[must_use]
    pub fn recipes(&self) -> RecipesManager {
        RecipesManager::new(self.pool.clone())
    }

    /// Meal plan queries
    #[must_use]
    pub fn meal_plans(&self) -> MealPlansManager {
        MealPlansManager::new(self.pool.clone())
    }
}

/// Parse an RFC 3339 column value
fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::internal(format!("Invalid datetime: {e}")))
}

/// Run one DDL statement
async fn execute_ddl(pool: &SqlitePool, statement: &str, table: &str) -> AppResult<()> {
    sqlx::query(statement)
        .execute(pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create {table}: {e}")))?;
    Ok(())
}

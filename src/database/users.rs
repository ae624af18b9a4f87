// ABOUTME: User profile storage keyed by identity provider uid
// ABOUTME: Holds the display name and the preference document captured at registration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{execute_ddl, parse_timestamp};
use crate::errors::{AppError, AppResult};

/// Locally stored part of a user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Identity provider uid
    pub user_id: String,
    /// Email address
    pub email: String,
    /// Display name, if any
    pub username: Option<String>,
    /// Free-form preference document
    pub preferences: Value,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// User profile queries
#[derive(Clone)]
pub struct UsersManager {
    pool: SqlitePool,
}

impl UsersManager {
    /// Create a new manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub(super) async fn migrate(&self) -> AppResult<()> {
        execute_ddl(
            &self.pool,
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                username TEXT,
                preferences TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            "users table",
        )
        .await
    }

    /// Insert a profile or overwrite the existing one for `user_id`
    ///
    /// # Errors
    ///
    /// Returns `DATABASE_ERROR` if the write fails.
    pub async fn upsert_profile(
        &self,
        user_id: &str,
        email: &str,
        username: Option<&str>,
        preferences: &Value,
    ) -> AppResult<UserProfile> {
        let now = Utc::now().to_rfc3339();
        let preferences_json = serde_json::to_string(preferences)?;

        sqlx::query(
            r"
            INSERT INTO users (id, email, username, preferences, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                username = excluded.username,
                preferences = excluded.preferences,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user_id)
        .bind(email)
        .bind(username)
        .bind(&preferences_json)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save user profile: {e}")))?;

        self.get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::database("User profile missing after upsert"))
    }

    /// Fetch a profile by uid
    ///
    /// # Errors
    ///
    /// Returns `DATABASE_ERROR` if the query fails.
    pub async fn get_profile(&self, user_id: &str) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query(
            r"
            SELECT id, email, username, preferences, created_at, updated_at
            FROM users WHERE id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user profile: {e}")))?;

        row.as_ref().map(row_to_profile).transpose()
    }
}

fn row_to_profile(row: &SqliteRow) -> AppResult<UserProfile> {
    let preferences_json: String = row.get("preferences");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(UserProfile {
        user_id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        preferences: serde_json::from_str(&preferences_json)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

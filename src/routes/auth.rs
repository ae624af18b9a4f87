// ABOUTME: User authentication route handlers for registration, login and logout
// ABOUTME: Accounts live with the identity provider; profiles and preferences are stored locally
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Authentication routes
//!
//! Registration creates the account with the identity provider and stores
//! the profile locally. Login verifies an ID token the client obtained from
//! the provider. Sessions are stateless, so logout only acknowledges.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::auth::{authenticate, AuthenticatedUser};
use crate::database::UserProfile;
use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::routes::ApiResponse;

/// User registration request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
    /// Display name, if any
    pub username: Option<String>,
    /// Stored preferences object
    #[serde(default = "empty_preferences")]
    pub preferences: Value,
}

fn empty_preferences() -> Value {
    Value::Object(serde_json::Map::new())
}

/// User registration response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// Identity provider uid
    pub user_id: String,
    /// Account email
    pub email: String,
    /// Display name, if any
    pub username: Option<String>,
    /// ID token for the new session
    pub token: String,
}

/// User login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// ID token issued by the identity provider
    #[serde(rename = "idToken")]
    pub id_token: String,
}

/// Profile returned on login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Identity provider uid
    pub user_id: String,
    /// Account email
    pub email: String,
    /// Display name, if any
    pub username: Option<String>,
    /// Stored preferences object
    pub preferences: Value,
}

impl From<UserProfile> for LoginResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            user_id: profile.user_id,
            email: profile.email,
            username: profile.username,
            preferences: profile.preferences,
        }
    }
}

/// Authentication routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::handle_register))
            .route("/api/auth/login", post(Self::handle_login))
            .route("/api/auth/logout", post(Self::handle_logout))
            .with_state(resources)
    }

    async fn authenticate(
        headers: &HeaderMap,
        resources: &Arc<ServerResources>,
    ) -> Result<AuthenticatedUser, AppError> {
        authenticate(headers, resources.identity.as_ref()).await
    }

    /// Handle user registration
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        body: Result<Json<RegisterRequest>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let Json(request) = body?;
        let email = request.email.trim();
        if email.is_empty() || request.password.is_empty() {
            return Err(AppError::invalid_input("email and password are required"));
        }
        if !request.preferences.is_object() {
            return Err(AppError::invalid_input("preferences must be a JSON object"));
        }

        let account = resources
            .identity
            .create_account(email, &request.password, request.username.as_deref())
            .await?;

        resources
            .database
            .users()
            .upsert_profile(
                &account.uid,
                &account.email,
                account.display_name.as_deref(),
                &request.preferences,
            )
            .await?;

        info!(user_id = %account.uid, "New user registered");

        let response = RegisterResponse {
            user_id: account.uid,
            email: account.email,
            username: account.display_name,
            token: account.id_token,
        };

        Ok(ApiResponse::data(response).with_status(StatusCode::CREATED))
    }

    /// Handle user login
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        body: Result<Json<LoginRequest>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let Json(request) = body?;
        let identity = resources
            .identity
            .verify_id_token(request.id_token.trim())
            .await?;

        let users = resources.database.users();
        let profile = match users.get_profile(&identity.uid).await? {
            Some(profile) => profile,
            // Accounts created outside this server get a profile on first login
            None => {
                users
                    .upsert_profile(
                        &identity.uid,
                        identity.email.as_deref().unwrap_or_default(),
                        identity.name.as_deref(),
                        &empty_preferences(),
                    )
                    .await?
            }
        };

        info!(user_id = %profile.user_id, "User logged in");

        Ok(ApiResponse::data(LoginResponse::from(profile)).into_response())
    }

    /// Handle user logout
    async fn handle_logout(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = Self::authenticate(&headers, &resources).await?;

        info!(user_id = %user.uid, "User logged out");

        Ok(ApiResponse::message("Logged out successfully").into_response())
    }
}

// ABOUTME: Recipe route handlers for generation, bookmarks, feedback, search and detail
// ABOUTME: Generation runs the full LLM and nutrition pipeline before responding
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{authenticate, AuthenticatedUser};
use crate::database::{NewRecipeFeedback, RecipeSearchFilters, RecipeSearchResult};
use crate::errors::AppError;
use crate::recipes::{PersistedRecipe, RecipeRequirements};
use crate::resources::ServerResources;
use crate::routes::ApiResponse;

/// Bookmark request
#[derive(Debug, Deserialize)]
pub struct SaveRecipeRequest {
    /// Recipe to bookmark
    pub recipe_id: String,
}

#[derive(Debug, Serialize)]
struct RecipeIdResponse {
    recipe_id: String,
}

#[derive(Debug, Serialize)]
struct FeedbackIdResponse {
    feedback_id: String,
}

#[derive(Debug, Serialize)]
struct RecipeListResponse<T> {
    recipes: Vec<T>,
}

/// Recipe routes
pub struct RecipeRoutes;

impl RecipeRoutes {
    /// Create all recipe routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/recipe/generate", post(Self::handle_generate))
            .route("/api/recipe/save", post(Self::handle_save))
            .route("/api/recipe/saved", get(Self::handle_list_saved))
            .route("/api/recipe/feedback", post(Self::handle_feedback))
            .route("/api/recipe/search", get(Self::handle_search))
            .route("/api/recipe/:recipe_id", get(Self::handle_get))
            .with_state(resources)
    }

    async fn authenticate(
        headers: &HeaderMap,
        resources: &Arc<ServerResources>,
    ) -> Result<AuthenticatedUser, AppError> {
        authenticate(headers, resources.identity.as_ref()).await
    }

    /// Generate, enrich and store a recipe
    async fn handle_generate(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Result<Json<RecipeRequirements>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let user = Self::authenticate(&headers, &resources).await?;
        let Json(requirements) = body?;
        requirements.validate()?;

        info!(user_id = %user.uid, "Generating recipe");
        let recipe = resources
            .recipe_generator
            .generate_recipe(&requirements, &user.uid)
            .await?;

        Ok(ApiResponse::data(recipe).into_response())
    }

    /// Bookmark a recipe for the caller
    async fn handle_save(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Result<Json<SaveRecipeRequest>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let user = Self::authenticate(&headers, &resources).await?;
        let Json(request) = body?;

        resources
            .database
            .recipes()
            .save_recipe(&user.uid, &request.recipe_id)
            .await?;
        info!(user_id = %user.uid, recipe_id = %request.recipe_id, "Recipe saved");

        Ok(ApiResponse::data(RecipeIdResponse {
            recipe_id: request.recipe_id,
        })
        .into_response())
    }

    /// List the caller's bookmarked recipes
    async fn handle_list_saved(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = Self::authenticate(&headers, &resources).await?;

        let recipes: Vec<PersistedRecipe> =
            resources.database.recipes().list_saved(&user.uid).await?;

        Ok(ApiResponse::data(RecipeListResponse { recipes }).into_response())
    }

    /// Record a rating for a recipe
    async fn handle_feedback(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Result<Json<NewRecipeFeedback>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let user = Self::authenticate(&headers, &resources).await?;
        let Json(feedback) = body?;

        let stored = resources
            .database
            .recipes()
            .add_feedback(&user.uid, &feedback)
            .await?;
        info!(
            user_id = %user.uid,
            recipe_id = %stored.recipe_id,
            rating = stored.rating,
            "Recipe feedback submitted"
        );

        Ok(ApiResponse::data(FeedbackIdResponse {
            feedback_id: stored.feedback_id,
        })
        .into_response())
    }

    /// Search recipes by text, cuisine and meal type
    async fn handle_search(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        query: Result<Query<RecipeSearchFilters>, QueryRejection>,
    ) -> Result<Response, AppError> {
        Self::authenticate(&headers, &resources).await?;
        let Query(filters) = query?;

        let recipes: Vec<RecipeSearchResult> =
            resources.database.recipes().search(&filters).await?;

        Ok(ApiResponse::data(RecipeListResponse { recipes }).into_response())
    }

    /// Fetch one recipe
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(recipe_id): Path<String>,
    ) -> Result<Response, AppError> {
        Self::authenticate(&headers, &resources).await?;

        let recipe = resources
            .database
            .recipes()
            .get_recipe(&recipe_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Recipe {recipe_id}")))?;

        Ok(ApiResponse::data(recipe).into_response())
    }
}

// ABOUTME: Meal plan route handlers for create, fetch, update and delete
// ABOUTME: Every lookup is scoped to the authenticated caller
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::auth::{authenticate, AuthenticatedUser};
use crate::database::{MealPlanUpdate, NewMealPlan};
use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::routes::ApiResponse;

/// Body of a meal plan update
#[derive(Debug, Deserialize)]
pub struct UpdateMealPlanRequest {
    /// Fields to change
    pub updates: MealPlanUpdate,
}

/// Meal plan routes
pub struct MealPlanRoutes;

impl MealPlanRoutes {
    /// Create all meal plan routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/meal-plan/create", post(Self::handle_create))
            .route(
                "/api/meal-plan/:meal_plan_id",
                get(Self::handle_get)
                    .put(Self::handle_update)
                    .delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    async fn authenticate(
        headers: &HeaderMap,
        resources: &Arc<ServerResources>,
    ) -> Result<AuthenticatedUser, AppError> {
        authenticate(headers, resources.identity.as_ref()).await
    }

    fn plan_not_found(meal_plan_id: &str) -> AppError {
        AppError::not_found(format!("Meal plan {meal_plan_id}"))
    }

    /// Create a meal plan
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Result<Json<NewMealPlan>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let user = Self::authenticate(&headers, &resources).await?;
        let Json(request) = body?;

        let plan = resources
            .database
            .meal_plans()
            .create(&user.uid, &request)
            .await?;
        info!(user_id = %user.uid, meal_plan_id = %plan.meal_plan_id, "Meal plan created");

        Ok(ApiResponse::data(plan).with_status(StatusCode::CREATED))
    }

    /// Fetch a meal plan
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(meal_plan_id): Path<String>,
    ) -> Result<Response, AppError> {
        let user = Self::authenticate(&headers, &resources).await?;

        let plan = resources
            .database
            .meal_plans()
            .get(&user.uid, &meal_plan_id)
            .await?
            .ok_or_else(|| Self::plan_not_found(&meal_plan_id))?;

        Ok(ApiResponse::data(plan).into_response())
    }

    /// Apply partial updates to a meal plan
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(meal_plan_id): Path<String>,
        body: Result<Json<UpdateMealPlanRequest>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let user = Self::authenticate(&headers, &resources).await?;
        let Json(request) = body?;

        let plan = resources
            .database
            .meal_plans()
            .update(&user.uid, &meal_plan_id, request.updates)
            .await?
            .ok_or_else(|| Self::plan_not_found(&meal_plan_id))?;
        info!(user_id = %user.uid, meal_plan_id = %meal_plan_id, "Meal plan updated");

        Ok(ApiResponse::data(plan).into_response())
    }

    /// Delete a meal plan
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(meal_plan_id): Path<String>,
    ) -> Result<Response, AppError> {
        let user = Self::authenticate(&headers, &resources).await?;

        let deleted = resources
            .database
            .meal_plans()
            .delete(&user.uid, &meal_plan_id)
            .await?;
        if !deleted {
            return Err(Self::plan_not_found(&meal_plan_id));
        }
        info!(user_id = %user.uid, meal_plan_id = %meal_plan_id, "Meal plan deleted");

        Ok(ApiResponse::message("Meal plan deleted successfully").into_response())
    }
}

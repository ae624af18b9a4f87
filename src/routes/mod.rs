// ABOUTME: Route module organization for the Mealwise HTTP API
// ABOUTME: Groups endpoints by domain and re-exports each route builder
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the Mealwise server
//!
//! Each domain module defines its routes and thin handlers that delegate to
//! the recipe pipeline, the receipt analyzer or the storage managers.
//! Protected groups resolve the caller with [`crate::auth::authenticate`].

/// Registration, login and logout routes
pub mod auth;
/// Health check routes
pub mod health;
/// Meal plan CRUD routes
pub mod meal_plans;
/// Receipt upload and analysis routes
pub mod receipts;
/// Recipe generation, bookmarking, feedback and search routes
pub mod recipes;
/// Success envelope shared by all handlers
pub mod response;

/// Authentication route handlers
pub use auth::AuthRoutes;
/// Health check route handlers
pub use health::HealthRoutes;
/// Meal plan route handlers
pub use meal_plans::MealPlanRoutes;
/// Receipt analysis route handlers
pub use receipts::ReceiptRoutes;
/// Recipe route handlers
pub use recipes::RecipeRoutes;
pub use response::ApiResponse;

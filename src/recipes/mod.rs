// ABOUTME: Recipe generation domain: models, prompts, strict decoding, nutrition lookup and the pipeline
// ABOUTME: Re-exports the types the HTTP layer and storage need
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Recipe Generation
//!
//! A run asks the model for a recipe skeleton, looks up nutrition data for
//! each ingredient, asks the model to aggregate per-serving nutrition facts
//! from that data, then stores the merged record.

/// Pipeline failure type
pub mod errors;
/// Requirements, skeleton, nutrition and stored recipe types
pub mod models;
/// Per-ingredient nutrition lookup
pub mod nutrition;
/// Strict decoding of model responses
pub mod parsing;
/// Stage orchestration
pub mod pipeline;
/// Prompt builders
pub mod prompts;

pub use errors::RecipePipelineError;
pub use models::{
    AggregateNutritionFacts, IngredientNutritionLookup, MacroValues, NewRecipe, PersistedRecipe,
    RecipeRequirements, RecipeSkeleton, RecipeStore, ServingBasis,
};
pub use pipeline::{GenerationConfig, RecipeGenerator};

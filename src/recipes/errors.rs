// ABOUTME: Typed failures of the recipe generation pipeline
// ABOUTME: Converts into AppError with the RECIPE_GENERATION_ERROR code at the HTTP boundary
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use thiserror::Error;

use crate::errors::{AppError, ErrorCode};

/// Failure of one recipe generation run
#[derive(Debug, Error)]
pub enum RecipePipelineError {
    /// The skeleton response was not JSON or did not match the schema
    #[error("Failed to parse generated recipe: {0}")]
    GenerationParse(String),

    /// A nutrition search or detail call failed for one ingredient.
    /// Logged and absorbed by the lookup stage; never returned from a run.
    #[error("Nutrition lookup failed for '{ingredient}': {message}")]
    NutritionService {
        /// Ingredient name from the skeleton line
        ingredient: String,
        /// Upstream failure
        message: String,
    },

    /// The aggregate nutrition response was not JSON or had no `nutritionFacts`
    #[error("Failed to parse nutrition facts: {0}")]
    NutritionParse(String),

    /// The recipe could not be stored
    #[error("Failed to save recipe: {0}")]
    Persistence(#[source] AppError),

    /// The language model call itself failed
    #[error("Language model request failed: {0}")]
    Llm(#[source] AppError),
}

impl From<RecipePipelineError> for AppError {
    fn from(error: RecipePipelineError) -> Self {
        let message = error.to_string();
        match error {
            RecipePipelineError::Llm(source) | RecipePipelineError::Persistence(source) => {
                Self::new(ErrorCode::RecipeGenerationError, message).with_source(source)
            }
            RecipePipelineError::GenerationParse(_)
            | RecipePipelineError::NutritionService { .. }
            | RecipePipelineError::NutritionParse(_) => {
                Self::new(ErrorCode::RecipeGenerationError, message)
            }
        }
    }
}

// ABOUTME: Strict decoding of LLM text responses into typed values
// ABOUTME: Trims surrounding whitespace only; fences or commentary are parse failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::de::DeserializeOwned;

use super::errors::RecipePipelineError;
use super::models::{AggregateNutritionFacts, NutritionFactsEnvelope, RecipeSkeleton};

/// Decode a model response as exactly one JSON value of type `T`
///
/// # Errors
///
/// Returns the `serde_json` error message when the trimmed text is not valid
/// JSON for `T`.
pub fn decode_strict<T: DeserializeOwned>(text: &str) -> Result<T, String> {
    serde_json::from_str(text.trim()).map_err(|e| e.to_string())
}

/// Decode the skeleton response
///
/// # Errors
///
/// `GenerationParse` when the text is not a schema-conforming JSON object, or
/// when the title, ingredients or instructions are empty.
pub fn parse_skeleton(text: &str) -> Result<RecipeSkeleton, RecipePipelineError> {
    let skeleton: RecipeSkeleton =
        decode_strict(text).map_err(RecipePipelineError::GenerationParse)?;

    if skeleton.title.trim().is_empty() {
        return Err(RecipePipelineError::GenerationParse(
            "recipe title is empty".to_owned(),
        ));
    }
    if skeleton.ingredients.is_empty() {
        return Err(RecipePipelineError::GenerationParse(
            "recipe has no ingredients".to_owned(),
        ));
    }
    if skeleton.instructions.is_empty() {
        return Err(RecipePipelineError::GenerationParse(
            "recipe has no instructions".to_owned(),
        ));
    }

    Ok(skeleton)
}

/// Decode the aggregate nutrition response
///
/// # Errors
///
/// `NutritionParse` when the text is not JSON, lacks the `nutritionFacts`
/// key, or a required macro is missing or not a number.
pub fn parse_nutrition_facts(text: &str) -> Result<AggregateNutritionFacts, RecipePipelineError> {
    decode_strict::<NutritionFactsEnvelope>(text)
        .map(|envelope| envelope.nutrition_facts)
        .map_err(RecipePipelineError::NutritionParse)
}

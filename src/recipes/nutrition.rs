// ABOUTME: Per-ingredient nutrition lookup stage of recipe generation
// ABOUTME: Parses ingredient lines, resolves foods, picks the 100 g serving and absorbs per-item failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Nutrition lookup
//!
//! Each skeleton line `"name: quantity unit"` costs one search and one detail
//! call against the [`NutritionSource`]. Lines that cannot be parsed, foods
//! that cannot be found and failing calls are logged and left out of the
//! result; the stage itself never fails.
//!
//! Lookups run in ingredient order. With a concurrency of 1 they are strictly
//! sequential; larger values keep up to that many lookups in flight while the
//! results stay in ingredient order.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use super::errors::RecipePipelineError;
use super::models::{IngredientNutritionLookup, MacroValues, ServingBasis};
use crate::external::{NutritionSource, ServingVariant};

/// Split an ingredient line on its first colon
///
/// Returns `(name, quantity)` with surrounding whitespace removed, or `None`
/// when the line has no colon or an empty name.
#[must_use]
pub fn parse_ingredient_line(line: &str) -> Option<(&str, &str)> {
    let (name, quantity) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, quantity.trim()))
}

fn is_100_gram_serving(variant: &ServingVariant) -> bool {
    if variant.serving_description.trim() == "100 g" {
        return true;
    }

    let amount = variant
        .metric_serving_amount
        .as_deref()
        .and_then(|amount| amount.trim().parse::<f64>().ok());
    let unit = variant.metric_serving_unit.as_deref().map(str::trim);

    matches!((amount, unit), (Some(amount), Some("g")) if (amount - 100.0).abs() < f64::EPSILON)
}

/// Pick the 100 g variant, falling back to the first one listed
///
/// The fallback values are not rescaled; the returned basis records which
/// serving they describe.
#[must_use]
pub fn select_serving(variants: &[ServingVariant]) -> Option<(&ServingVariant, ServingBasis)> {
    if let Some(variant) = variants.iter().find(|v| is_100_gram_serving(v)) {
        return Some((variant, ServingBasis::Per100g));
    }

    variants
        .first()
        .map(|variant| (variant, ServingBasis::Serving(variant.serving_description.clone())))
}

fn parse_value(value: Option<&String>) -> Option<f64> {
    value.and_then(|v| v.trim().parse::<f64>().ok())
}

/// Parse the string macro values of a serving variant
///
/// Returns `None` if calories, protein, carbohydrate or fat is missing or
/// not a number.
#[must_use]
pub fn parse_macros(variant: &ServingVariant) -> Option<MacroValues> {
    Some(MacroValues {
        calories: parse_value(variant.calories.as_ref())?,
        protein: parse_value(variant.protein.as_ref())?,
        carbs: parse_value(variant.carbohydrate.as_ref())?,
        fat: parse_value(variant.fat.as_ref())?,
        fiber: parse_value(variant.fiber.as_ref()),
        sugar: parse_value(variant.sugar.as_ref()),
        sodium: parse_value(variant.sodium.as_ref()),
    })
}

fn log_service_failure(error: &RecipePipelineError) {
    warn!(stage = "nutrition_lookup", error = %error, "Continuing without nutrition data");
}

/// Resolve nutrition data for one ingredient line
async fn lookup_one(
    source: Arc<dyn NutritionSource>,
    line: String,
) -> Option<IngredientNutritionLookup> {
    let Some((name, quantity)) = parse_ingredient_line(&line) else {
        warn!(stage = "nutrition_lookup", line = %line, "Malformed ingredient line, skipping lookup");
        return None;
    };

    let candidates = match source.search_foods(name).await {
        Ok(candidates) => candidates,
        Err(e) => {
            log_service_failure(&RecipePipelineError::NutritionService {
                ingredient: name.to_owned(),
                message: e.to_string(),
            });
            return None;
        }
    };

    let Some(candidate) = candidates.into_iter().next() else {
        info!(stage = "nutrition_lookup", ingredient = name, "No matching food found");
        return None;
    };

    let servings = match source.food_servings(&candidate.food_id).await {
        Ok(servings) => servings,
        Err(e) => {
            log_service_failure(&RecipePipelineError::NutritionService {
                ingredient: name.to_owned(),
                message: e.to_string(),
            });
            return None;
        }
    };

    let Some((variant, basis)) = select_serving(&servings) else {
        info!(
            stage = "nutrition_lookup",
            ingredient = name,
            food_id = %candidate.food_id,
            "Food has no serving data"
        );
        return None;
    };

    let Some(macros) = parse_macros(variant) else {
        warn!(
            stage = "nutrition_lookup",
            ingredient = name,
            food_id = %candidate.food_id,
            serving = %variant.serving_description,
            "Serving has unparseable macro values"
        );
        return None;
    };

    debug!(
        stage = "nutrition_lookup",
        ingredient = name,
        food_id = %candidate.food_id,
        basis = %basis,
        "Resolved ingredient nutrition"
    );

    Some(IngredientNutritionLookup {
        ingredient: name.to_owned(),
        quantity: quantity.to_owned(),
        food_id: candidate.food_id,
        food_name: candidate.food_name,
        basis,
        macros,
    })
}

/// Look up every ingredient line, keeping only resolved entries
///
/// `concurrency` is the number of lookups kept in flight; 0 is treated as 1.
/// Each lookup future owns its inputs so the returned future stays `Send`.
pub async fn lookup_ingredients(
    source: Arc<dyn NutritionSource>,
    lines: Vec<String>,
    concurrency: usize,
) -> Vec<IngredientNutritionLookup> {
    let requested = lines.len();
    let resolved: Vec<Option<IngredientNutritionLookup>> = stream::iter(lines)
        .map(move |line| lookup_one(Arc::clone(&source), line))
        .buffered(concurrency.max(1))
        .collect()
        .await;
    let lookups: Vec<IngredientNutritionLookup> = resolved.into_iter().flatten().collect();

    info!(
        stage = "nutrition_lookup",
        requested,
        resolved = lookups.len(),
        "Nutrition lookup finished"
    );
    lookups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(description: &str, calories: &str) -> ServingVariant {
        ServingVariant {
            serving_description: description.to_owned(),
            calories: Some(calories.to_owned()),
            protein: Some("1".to_owned()),
            carbohydrate: Some("2".to_owned()),
            fat: Some("3".to_owned()),
            ..ServingVariant::default()
        }
    }

    #[test]
    fn test_parse_ingredient_line() {
        assert_eq!(
            parse_ingredient_line("shrimp: 200 grams"),
            Some(("shrimp", "200 grams"))
        );
        assert_eq!(
            parse_ingredient_line("soy sauce: 2 tbsp: low sodium"),
            Some(("soy sauce", "2 tbsp: low sodium"))
        );
        assert_eq!(parse_ingredient_line("salt to taste"), None);
        assert_eq!(parse_ingredient_line(": 1 cup"), None);
    }

    #[test]
    fn test_select_serving_prefers_100g_description() {
        let variants = vec![variant("1 cup", "200"), variant("100 g", "131")];
        let (selected, basis) = select_serving(&variants).unwrap();
        assert_eq!(selected.calories.as_deref(), Some("131"));
        assert_eq!(basis, ServingBasis::Per100g);
    }

    #[test]
    fn test_select_serving_matches_metric_amount() {
        let mut metric = variant("3.5 oz", "99");
        metric.metric_serving_amount = Some("100.000".to_owned());
        metric.metric_serving_unit = Some("g".to_owned());

        let variants = vec![variant("1 piece", "40"), metric];
        let (selected, basis) = select_serving(&variants).unwrap();
        assert_eq!(selected.serving_description, "3.5 oz");
        assert_eq!(basis, ServingBasis::Per100g);
    }

    #[test]
    fn test_select_serving_falls_back_to_first() {
        let mut ml = variant("1 cup", "120");
        ml.metric_serving_amount = Some("100.000".to_owned());
        ml.metric_serving_unit = Some("ml".to_owned());

        let variants = vec![ml, variant("1 tbsp", "10")];
        let (selected, basis) = select_serving(&variants).unwrap();
        assert_eq!(selected.calories.as_deref(), Some("120"));
        assert_eq!(basis, ServingBasis::Serving("1 cup".to_owned()));

        assert!(select_serving(&[]).is_none());
    }

    #[test]
    fn test_parse_macros_requires_core_values() {
        let mut serving = variant("100 g", "131");
        serving.sodium = Some("5".to_owned());
        let macros = parse_macros(&serving).unwrap();
        assert!((macros.calories - 131.0).abs() < f64::EPSILON);
        assert_eq!(macros.sodium, Some(5.0));
        assert!(macros.fiber.is_none());

        serving.fat = Some("n/a".to_owned());
        assert!(parse_macros(&serving).is_none());
    }
}

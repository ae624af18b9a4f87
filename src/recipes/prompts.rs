// ABOUTME: Prompt construction for recipe skeleton, aggregate nutrition and receipt analysis calls
// ABOUTME: Every prompt demands a bare JSON answer that the strict decoders can read
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::Write as _;

use super::models::{IngredientNutritionLookup, RecipeRequirements, RecipeSkeleton};
use crate::llm::ChatMessage;

const SKELETON_SYSTEM_PROMPT: &str = "You are a professional chef and recipe developer. \
You write practical home-cooking recipes that respect every constraint you are given. \
You always answer with a single JSON object and nothing else: no markdown, no code fences, no commentary.";

const NUTRITION_SYSTEM_PROMPT: &str = "You are a registered dietitian. \
You compute nutrition facts from ingredient quantities and reference nutrition data. \
You always answer with a single JSON object and nothing else: no markdown, no code fences, no commentary.";

const RECEIPT_SYSTEM_PROMPT: &str = "You are an expert at identifying food ingredients from receipt text. \
Analyze the following receipt text and identify all food ingredients. \
Return ONLY a JSON array of ingredients in both Korean and English if possible. \
Format: [\"ingredient1\", \"ingredient2\", ...]";

fn join_or_none<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    let joined = items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        "none".to_owned()
    } else {
        joined
    }
}

/// Messages asking for a recipe skeleton that satisfies the requirements
#[must_use]
pub fn skeleton_messages(requirements: &RecipeRequirements) -> Vec<ChatMessage> {
    let mut prompt = String::from("Create one recipe with these requirements:\n");

    // Writing to a String cannot fail
    let _ = writeln!(prompt, "- Meal type: {}", requirements.meal_type);
    let _ = writeln!(prompt, "- Cuisine: {}", requirements.cuisine_type);
    let _ = writeln!(
        prompt,
        "- Dietary restrictions: {}",
        join_or_none(&requirements.dietary_restrictions)
    );
    let _ = writeln!(
        prompt,
        "- Allergies (never use these or anything containing them): {}",
        join_or_none(&requirements.allergies)
    );
    let _ = writeln!(prompt, "- Servings: {}", requirements.servings);
    match requirements.calorie_limit {
        Some(limit) => {
            let _ = writeln!(prompt, "- Calorie limit: at most {limit} kcal per serving");
        }
        None => prompt.push_str("- Calorie limit: none\n"),
    }
    let _ = writeln!(
        prompt,
        "- Ingredients that must be used: {}",
        join_or_none(&requirements.required_ingredients)
    );
    if requirements.additional_preferences.is_empty() {
        prompt.push_str("- Additional preferences: none\n");
    } else {
        let _ = writeln!(
            prompt,
            "- Additional preferences: {}",
            serde_json::Value::Object(requirements.additional_preferences.clone())
        );
    }

    prompt.push_str(
        "\nRespond with ONLY a JSON object matching exactly this schema:\n\
         {\n\
         \x20 \"title\": string,\n\
         \x20 \"description\": string,\n\
         \x20 \"ingredients\": [\"name: quantity unit\", ...],\n\
         \x20 \"instructions\": [\"step\", ...],\n\
         \x20 \"cookingTime\": string,\n\
         \x20 \"skillLevel\": \"easy\" | \"medium\" | \"hard\"\n\
         }\n\
         Write each ingredient as \"name: quantity unit\", for example \"shrimp: 200 grams\". \
         Use metric quantities where possible.\n\
         Do NOT include any nutrition information; it is calculated separately.\n\
         Keep the description under 200 characters, use at most 15 ingredients \
         and at most 12 instruction steps.",
    );

    vec![
        ChatMessage::system(SKELETON_SYSTEM_PROMPT),
        ChatMessage::user(prompt),
    ]
}

/// Messages asking the model to aggregate per-serving nutrition facts
#[must_use]
pub fn nutrition_messages(
    skeleton: &RecipeSkeleton,
    lookups: &[IngredientNutritionLookup],
    servings: u32,
) -> Vec<ChatMessage> {
    let mut prompt = format!("Recipe: {}\nServings: {servings}\n\nIngredients:\n", skeleton.title);
    for line in &skeleton.ingredients {
        let _ = writeln!(prompt, "- {line}");
    }

    if lookups.is_empty() {
        prompt.push_str(
            "\nNo reference nutrition data is available for these ingredients. \
             Estimate the values from typical nutrition data.\n",
        );
    } else {
        prompt.push_str("\nReference nutrition data from a food database:\n");
        for lookup in lookups {
            let macros = &lookup.macros;
            let _ = write!(
                prompt,
                "- {} ({}; matched \"{}\"), {}: calories {} kcal, protein {} g, carbs {} g, fat {} g",
                lookup.ingredient,
                lookup.quantity,
                lookup.food_name,
                lookup.basis,
                macros.calories,
                macros.protein,
                macros.carbs,
                macros.fat,
            );
            if let Some(fiber) = macros.fiber {
                let _ = write!(prompt, ", fiber {fiber} g");
            }
            if let Some(sugar) = macros.sugar {
                let _ = write!(prompt, ", sugar {sugar} g");
            }
            if let Some(sodium) = macros.sodium {
                let _ = write!(prompt, ", sodium {sodium} mg");
            }
            prompt.push('\n');
        }
        prompt.push_str(
            "Scale each entry by the ingredient quantity. Entries marked \"per serving\" \
             refer to that serving size, not to 100 g. Estimate ingredients without reference data.\n",
        );
    }

    prompt.push_str(
        "\nCompute the nutrition facts PER SERVING for the whole recipe. \
         Respond with ONLY a JSON object of this form, all values numbers:\n\
         {\"nutritionFacts\": {\"calories\": number, \"protein\": number, \"carbs\": number, \
         \"fat\": number, \"fiber\": number, \"sugar\": number, \"sodium\": number}}\n\
         Use kcal for calories, milligrams for sodium and grams for everything else.",
    );

    vec![
        ChatMessage::system(NUTRITION_SYSTEM_PROMPT),
        ChatMessage::user(prompt),
    ]
}

/// Messages asking for the ingredients printed on a receipt
#[must_use]
pub fn receipt_messages(receipt_text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(RECEIPT_SYSTEM_PROMPT),
        ChatMessage::user(receipt_text),
    ]
}

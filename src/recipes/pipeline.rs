// ABOUTME: Recipe generation pipeline: skeleton prompt, nutrition lookups, aggregate prompt, persist
// ABOUTME: Runs the stages in order and aborts on any failure outside the lookup stage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use tracing::{info, instrument};

use super::errors::RecipePipelineError;
use super::models::{NewRecipe, PersistedRecipe, RecipeRequirements, RecipeStore};
use super::nutrition::lookup_ingredients;
use super::parsing::{parse_nutrition_facts, parse_skeleton};
use super::prompts::{nutrition_messages, skeleton_messages};
use crate::external::NutritionSource;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

/// Sampling and sizing parameters for the two model calls
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Model override; `None` uses the provider default
    pub model: Option<String>,
    /// Sampling temperature for the skeleton call
    pub skeleton_temperature: f32,
    /// Response cap for the skeleton call
    pub skeleton_max_tokens: u32,
    /// Sampling temperature for the aggregate call
    pub nutrition_temperature: f32,
    /// Response cap for the aggregate call
    pub nutrition_max_tokens: u32,
    /// Nutrition lookups kept in flight (1 = sequential)
    pub lookup_concurrency: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: None,
            skeleton_temperature: 0.7,
            skeleton_max_tokens: 1500,
            nutrition_temperature: 0.3,
            nutrition_max_tokens: 500,
            lookup_concurrency: 1,
        }
    }
}

/// Generates, enriches and stores recipes
pub struct RecipeGenerator {
    llm: Arc<dyn LlmProvider>,
    nutrition: Arc<dyn NutritionSource>,
    store: Arc<dyn RecipeStore>,
    config: GenerationConfig,
}

impl RecipeGenerator {
    /// Create a generator from its collaborators
    #[must_use]
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        nutrition: Arc<dyn NutritionSource>,
        store: Arc<dyn RecipeStore>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            llm,
            nutrition,
            store,
            config,
        }
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, RecipePipelineError> {
        let mut request = ChatRequest::new(messages)
            .with_temperature(temperature)
            .with_max_tokens(max_tokens);
        if let Some(model) = &self.config.model {
            request = request.with_model(model.clone());
        }

        self.llm
            .complete(&request)
            .await
            .map(|response| response.content)
            .map_err(RecipePipelineError::Llm)
    }

    /// Run one generation for `caller_id`
    ///
    /// Nothing is stored unless every stage succeeds. Nutrition lookup
    /// failures only shrink the data passed to the aggregate prompt.
    ///
    /// # Errors
    ///
    /// `Llm` if a model call fails, `GenerationParse` or `NutritionParse` if
    /// a response cannot be decoded, and `Persistence` if the store rejects
    /// the record.
    #[instrument(
        skip(self, requirements),
        fields(meal_type = %requirements.meal_type, cuisine_type = %requirements.cuisine_type)
    )]
    pub async fn generate_recipe(
        &self,
        requirements: &RecipeRequirements,
        caller_id: &str,
    ) -> Result<PersistedRecipe, RecipePipelineError> {
        let response = self
            .complete(
                skeleton_messages(requirements),
                self.config.skeleton_temperature,
                self.config.skeleton_max_tokens,
            )
            .await?;
        let skeleton = parse_skeleton(&response)?;
        info!(
            stage = "skeleton",
            title = %skeleton.title,
            ingredients = skeleton.ingredients.len(),
            "Recipe skeleton generated"
        );

        let lookups = lookup_ingredients(
            Arc::clone(&self.nutrition),
            skeleton.ingredients.clone(),
            self.config.lookup_concurrency,
        )
        .await;

        let response = self
            .complete(
                nutrition_messages(&skeleton, &lookups, requirements.servings),
                self.config.nutrition_temperature,
                self.config.nutrition_max_tokens,
            )
            .await?;
        let nutrition_facts = parse_nutrition_facts(&response)?;
        info!(
            stage = "nutrition_facts",
            calories = nutrition_facts.calories,
            "Aggregate nutrition computed"
        );

        let recipe = self
            .store
            .create_recipe(NewRecipe {
                user_id: caller_id.to_owned(),
                requirements: requirements.clone(),
                skeleton,
                nutrition_facts,
            })
            .await
            .map_err(RecipePipelineError::Persistence)?;

        info!(stage = "persist", recipe_id = %recipe.id, "Recipe stored");
        Ok(recipe)
    }
}

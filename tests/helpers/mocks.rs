// ABOUTME: In-process doubles for the language model, nutrition database, identity provider and OCR
// ABOUTME: Each double scripts its answers and records the calls it receives
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use mealwise_server::auth::{CreatedAccount, IdentityProvider, VerifiedIdentity};
use mealwise_server::errors::{AppError, AppResult, ErrorCode};
use mealwise_server::external::{FoodCandidate, NutritionSource, ServingVariant, TextRecognizer};
use mealwise_server::llm::{ChatRequest, ChatResponse, LlmProvider};
use mealwise_server::recipes::{NewRecipe, PersistedRecipe, RecipeStore};

/// Ordered record of calls shared between doubles
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

// ============================================================================
// Language model
// ============================================================================

/// Language model that replays scripted answers in order
pub struct MockLlm {
    responses: Mutex<VecDeque<AppResult<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
    log: CallLog,
    healthy: bool,
}

impl MockLlm {
    pub fn new(responses: Vec<AppResult<String>>) -> Self {
        Self::with_log(responses, CallLog::default())
    }

    pub fn with_log(responses: Vec<AppResult<String>>, log: CallLog) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            log,
            healthy: true,
        }
    }

    /// Script plain-text answers
    pub fn replying(responses: &[&str]) -> Self {
        Self::new(responses.iter().map(|r| Ok((*r).to_owned())).collect())
    }

    /// Report the provider as unreachable from `health_check`
    #[must_use]
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        self.log.push("llm");

        let next = self.responses.lock().unwrap().pop_front();
        let content = next.unwrap_or_else(|| Err(AppError::internal("No scripted LLM response")))?;

        Ok(ChatResponse {
            content,
            model: "mock-model".to_owned(),
            usage: None,
            finish_reason: Some("stop".to_owned()),
        })
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(self.healthy)
    }
}

// ============================================================================
// Nutrition database
// ============================================================================

/// Serving variant with the four required macros
pub fn serving(description: &str, calories: &str, protein: &str, carbs: &str, fat: &str) -> ServingVariant {
    ServingVariant {
        serving_description: description.to_owned(),
        calories: Some(calories.to_owned()),
        protein: Some(protein.to_owned()),
        carbohydrate: Some(carbs.to_owned()),
        fat: Some(fat.to_owned()),
        ..ServingVariant::default()
    }
}

struct MockFood {
    candidate: FoodCandidate,
    servings: Vec<ServingVariant>,
}

/// Nutrition database keyed by lowercase search query
#[derive(Default)]
pub struct MockNutrition {
    foods: HashMap<String, MockFood>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    log: CallLog,
}

impl MockNutrition {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Register a food found for `query`
    #[must_use]
    pub fn with_food(
        mut self,
        query: &str,
        food_id: &str,
        food_name: &str,
        servings: Vec<ServingVariant>,
    ) -> Self {
        self.foods.insert(
            query.to_lowercase(),
            MockFood {
                candidate: FoodCandidate {
                    food_id: food_id.to_owned(),
                    food_name: food_name.to_owned(),
                },
                servings,
            },
        );
        self
    }

    /// Make searches for `query` fail with an upstream error
    #[must_use]
    pub fn failing_on(mut self, query: &str) -> Self {
        self.failing.insert(query.to_lowercase());
        self
    }

    /// Delay searches for `query`
    #[must_use]
    pub fn delayed(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_lowercase(), delay);
        self
    }

    /// Highest number of searches observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NutritionSource for MockNutrition {
    async fn search_foods(&self, query: &str) -> AppResult<Vec<FoodCandidate>> {
        let key = query.to_lowercase();
        self.log.push(format!("search:{key}"));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&key) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&key) {
            return Err(AppError::external_service("FatSecret", "upstream unavailable"));
        }

        Ok(self
            .foods
            .get(&key)
            .map(|food| vec![food.candidate.clone()])
            .unwrap_or_default())
    }

    async fn food_servings(&self, food_id: &str) -> AppResult<Vec<ServingVariant>> {
        self.log.push(format!("servings:{food_id}"));

        self.foods
            .values()
            .find(|food| food.candidate.food_id == food_id)
            .map(|food| food.servings.clone())
            .ok_or_else(|| AppError::not_found(format!("Food {food_id}")))
    }
}

// ============================================================================
// Recipe store
// ============================================================================

/// Store that keeps created recipes in memory
#[derive(Default)]
pub struct MockRecipeStore {
    recipes: Mutex<Vec<PersistedRecipe>>,
    log: CallLog,
    fail: bool,
}

impl MockRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Reject every write
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn stored(&self) -> Vec<PersistedRecipe> {
        self.recipes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecipeStore for MockRecipeStore {
    async fn create_recipe(&self, recipe: NewRecipe) -> AppResult<PersistedRecipe> {
        self.log.push("store");
        if self.fail {
            return Err(AppError::database("disk full"));
        }

        let count = self.recipes.lock().unwrap().len();
        let persisted = PersistedRecipe::from_new(recipe, format!("recipe-{count}"), Utc::now());
        self.recipes.lock().unwrap().push(persisted.clone());
        Ok(persisted)
    }
}

// ============================================================================
// Identity provider
// ============================================================================

/// Identity provider accepting a fixed set of tokens
#[derive(Default)]
pub struct MockIdentity {
    tokens: Mutex<HashMap<String, VerifiedIdentity>>,
    registered: Mutex<HashSet<String>>,
}

impl MockIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as belonging to `uid`
    #[must_use]
    pub fn with_user(self, token: &str, uid: &str, email: &str) -> Self {
        self.tokens.lock().unwrap().insert(
            token.to_owned(),
            VerifiedIdentity {
                uid: uid.to_owned(),
                email: Some(email.to_owned()),
                email_verified: true,
                name: None,
            },
        );
        self
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn verify_id_token(&self, token: &str) -> AppResult<VerifiedIdentity> {
        self.tokens
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::auth_invalid("Invalid ID token"))
    }

    async fn create_account(
        &self,
        email: &str,
        _password: &str,
        display_name: Option<&str>,
    ) -> AppResult<CreatedAccount> {
        if !self.registered.lock().unwrap().insert(email.to_owned()) {
            return Err(AppError::new(
                ErrorCode::ResourceAlreadyExists,
                "The email address is already in use",
            ));
        }

        let uid = format!("uid-{email}");
        let id_token = format!("token-{uid}");
        self.tokens.lock().unwrap().insert(
            id_token.clone(),
            VerifiedIdentity {
                uid: uid.clone(),
                email: Some(email.to_owned()),
                email_verified: false,
                name: display_name.map(str::to_owned),
            },
        );

        Ok(CreatedAccount {
            uid,
            email: email.to_owned(),
            display_name: display_name.map(str::to_owned),
            id_token,
        })
    }
}

// ============================================================================
// OCR
// ============================================================================

/// Text recognizer returning fixed text, or failing when none is set
pub struct MockOcr {
    text: Option<String>,
    calls: Mutex<Vec<(String, String, usize)>>,
}

impl MockOcr {
    pub fn returning(text: &str) -> Self {
        Self {
            text: Some(text.to_owned()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            text: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(file_name, content_type, byte_len)` per call
    pub fn calls(&self) -> Vec<(String, String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextRecognizer for MockOcr {
    async fn recognize(&self, image: Bytes, file_name: &str, content_type: &str) -> AppResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((file_name.to_owned(), content_type.to_owned(), image.len()));

        self.text
            .clone()
            .ok_or_else(|| AppError::external_service("OCR service", "Failed to process image"))
    }
}

// ABOUTME: Shared server resources handed to every route group
// ABOUTME: Wires configuration, storage and external service clients into the pipelines
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Server Resources
//!
//! Everything a handler needs is created once at startup and shared through
//! `Arc<ServerResources>`. External services sit behind traits so tests can
//! swap in in-process implementations.

use std::sync::Arc;

use crate::auth::{FirebaseAuth, IdentityProvider};
use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::AppResult;
use crate::external::{
    FatSecretClient, FatSecretClientConfig, NutritionSource, OcrClient, OcrClientConfig,
    TextRecognizer,
};
use crate::llm::{LlmProvider, OpenAiCompatibleConfig, OpenAiCompatibleProvider};
use crate::receipts::ReceiptAnalyzer;
use crate::recipes::{GenerationConfig, RecipeGenerator};

/// Centralized resource container for dependency injection
pub struct ServerResources {
    /// Validated server configuration
    pub config: Arc<ServerConfig>,
    /// Storage handle
    pub database: Database,
    /// Token verification and account creation
    pub identity: Arc<dyn IdentityProvider>,
    /// Language model shared by the pipelines and the readiness check
    pub llm: Arc<dyn LlmProvider>,
    /// Recipe pipeline
    pub recipe_generator: Arc<RecipeGenerator>,
    /// Receipt OCR and ingredient extraction
    pub receipt_analyzer: Arc<ReceiptAnalyzer>,
}

impl ServerResources {
    /// Assemble resources from explicit collaborators
    #[must_use]
    pub fn new(
        config: Arc<ServerConfig>,
        database: Database,
        identity: Arc<dyn IdentityProvider>,
        llm: Arc<dyn LlmProvider>,
        nutrition: Arc<dyn NutritionSource>,
        ocr: Arc<dyn TextRecognizer>,
    ) -> Self {
        let model = Some(config.llm.model.clone()).filter(|m| !m.is_empty());

        let generation = GenerationConfig {
            model: model.clone(),
            lookup_concurrency: config.nutrition.lookup_concurrency,
            ..GenerationConfig::default()
        };
        let recipe_generator = Arc::new(RecipeGenerator::new(
            Arc::clone(&llm),
            nutrition,
            Arc::new(database.recipes()),
            generation,
        ));
        let receipt_analyzer = Arc::new(ReceiptAnalyzer::new(ocr, Arc::clone(&llm), model));

        Self {
            config,
            database,
            identity,
            llm,
            recipe_generator,
            receipt_analyzer,
        }
    }

    /// Build the production clients described by `config`
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be constructed.
    pub fn from_config(config: Arc<ServerConfig>, database: Database) -> AppResult<Self> {
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(FirebaseAuth::new(config.firebase.clone()));
        let llm: Arc<dyn LlmProvider> = Arc::new(OpenAiCompatibleProvider::new(
            OpenAiCompatibleConfig::from(&config.llm),
        )?);
        let nutrition: Arc<dyn NutritionSource> = Arc::new(FatSecretClient::new(
            FatSecretClientConfig::from(&config.nutrition),
        ));
        let ocr: Arc<dyn TextRecognizer> =
            Arc::new(OcrClient::new(OcrClientConfig::from(&config.ocr)));

        Ok(Self::new(config, database, identity, llm, nutrition, ocr))
    }
}

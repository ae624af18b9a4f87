// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides logging, in-memory database and server resource helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `mealwise_server`

use std::sync::{Arc, Once};

use mealwise_server::{
    auth::IdentityProvider,
    config::{DatabaseConfig, DatabaseUrl, LlmConfig, OcrConfig, ServerConfig},
    database::Database,
    external::{NutritionSource, TextRecognizer},
    llm::LlmProvider,
    resources::ServerResources,
    server::MealwiseServer,
};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Standard test database setup
pub async fn create_test_database() -> Database {
    init_test_logging();
    Database::new("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database")
}

/// Configuration with an in-memory database and a small upload limit
pub fn test_config() -> ServerConfig {
    ServerConfig {
        database: DatabaseConfig {
            url: DatabaseUrl::Memory,
        },
        llm: LlmConfig {
            model: "mock-model".to_owned(),
            ..LlmConfig::default()
        },
        ocr: OcrConfig {
            max_upload_bytes: 1024,
            ..OcrConfig::default()
        },
        ..ServerConfig::default()
    }
}

/// External service doubles used to build server resources
pub struct TestServices {
    pub identity: Arc<dyn IdentityProvider>,
    pub llm: Arc<dyn LlmProvider>,
    pub nutrition: Arc<dyn NutritionSource>,
    pub ocr: Arc<dyn TextRecognizer>,
}

/// Build resources over a fresh in-memory database
pub async fn create_test_resources(services: TestServices) -> Arc<ServerResources> {
    let database = create_test_database().await;
    Arc::new(ServerResources::new(
        Arc::new(test_config()),
        database,
        services.identity,
        services.llm,
        services.nutrition,
        services.ocr,
    ))
}

/// Full application router over `resources`
pub fn test_router(resources: &Arc<ServerResources>) -> axum::Router {
    MealwiseServer::new(Arc::clone(resources)).router()
}

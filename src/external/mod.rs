// ABOUTME: External API client modules (FatSecret nutrition database, OCR microservice)
// ABOUTME: Defines the NutritionSource and TextRecognizer seams the core logic depends on
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! External API Clients
//!
//! The recipe pipeline and the receipt analyzer never talk to HTTP services
//! directly. They depend on the traits below, which the `FatSecret` and OCR
//! clients implement and tests replace with in-process fakes.

/// `FatSecret` Platform API client
pub mod fatsecret_client;
/// OCR microservice client
pub mod ocr_client;

pub use fatsecret_client::{FatSecretClient, FatSecretClientConfig};
pub use ocr_client::{OcrClient, OcrClientConfig};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::AppResult;

/// A candidate food returned by a free-text search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodCandidate {
    /// Nutrition database identifier
    pub food_id: String,
    /// Display name of the food
    pub food_name: String,
}

/// One serving-size variant of a food with its macro values
///
/// Values are kept as the strings the nutrition database returns; callers
/// parse what they need.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServingVariant {
    /// Human readable serving label, e.g. "100 g" or "1 cup"
    #[serde(default)]
    pub serving_description: String,
    /// Metric amount of the serving, e.g. `"100.000"`
    #[serde(default)]
    pub metric_serving_amount: Option<String>,
    /// Metric unit, e.g. `"g"`
    #[serde(default)]
    pub metric_serving_unit: Option<String>,
    /// Calories (kcal)
    #[serde(default)]
    pub calories: Option<String>,
    /// Protein (g)
    #[serde(default)]
    pub protein: Option<String>,
    /// Carbohydrate (g)
    #[serde(default)]
    pub carbohydrate: Option<String>,
    /// Fat (g)
    #[serde(default)]
    pub fat: Option<String>,
    /// Fiber (g)
    #[serde(default)]
    pub fiber: Option<String>,
    /// Sugar (g)
    #[serde(default)]
    pub sugar: Option<String>,
    /// Sodium (mg)
    #[serde(default)]
    pub sodium: Option<String>,
}

/// Food database used for per-ingredient nutrition lookups
#[async_trait]
pub trait NutritionSource: Send + Sync {
    /// Free-text food search, best match first
    async fn search_foods(&self, query: &str) -> AppResult<Vec<FoodCandidate>>;

    /// All serving variants recorded for a food
    async fn food_servings(&self, food_id: &str) -> AppResult<Vec<ServingVariant>>;
}

/// Optical character recognition for uploaded images
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Extract the text printed on an image
    async fn recognize(&self, image: Bytes, file_name: &str, content_type: &str)
        -> AppResult<String>;
}

// ABOUTME: FatSecret Platform API client for food search and serving-level nutrition data
// ABOUTME: Handles OAuth2 client-credentials tokens and the API's one-or-many JSON quirk
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! `FatSecret` Platform API Client
//!
//! Implements [`NutritionSource`] on top of the `FatSecret` REST API.
//!
//! # Features
//! - OAuth 2.0 client-credentials token, cached until shortly before expiry
//! - `foods.search` for free-text lookups
//! - `food.get.v2` for serving-level macro values
//!
//! # API Reference
//! <https://platform.fatsecret.com/docs/guides>
//!
//! # Example
//! ```rust,no_run
//! use mealwise_server::external::{FatSecretClient, FatSecretClientConfig, NutritionSource};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FatSecretClientConfig {
//!     client_id: Some("client-id".to_owned()),
//!     client_secret: Some("client-secret".to_owned()),
//!     ..FatSecretClientConfig::default()
//! };
//!
//! let client = FatSecretClient::new(config);
//! let foods = client.search_foods("shrimp").await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{FoodCandidate, NutritionSource, ServingVariant};
use crate::config::NutritionConfig;
use crate::errors::{AppError, AppResult, ErrorCode};

const SERVICE_NAME: &str = "FatSecret API";

/// Refresh the token this long before the server-side expiry
const TOKEN_REFRESH_MARGIN_SECS: u64 = 60;

/// `FatSecret` client configuration
#[derive(Debug, Clone)]
pub struct FatSecretClientConfig {
    /// OAuth2 client id
    pub client_id: Option<String>,
    /// OAuth2 client secret
    pub client_secret: Option<String>,
    /// REST endpoint (default: <https://platform.fatsecret.com/rest/server.api>)
    pub base_url: String,
    /// Token endpoint (default: <https://oauth.fatsecret.com/connect/token>)
    pub token_url: String,
    /// OAuth2 scope requested for the token
    pub scope: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for FatSecretClientConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            base_url: "https://platform.fatsecret.com/rest/server.api".to_owned(),
            token_url: "https://oauth.fatsecret.com/connect/token".to_owned(),
            scope: "basic".to_owned(),
            timeout_secs: 30,
        }
    }
}

impl From<&NutritionConfig> for FatSecretClientConfig {
    fn from(config: &NutritionConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            base_url: config.base_url.clone(),
            token_url: config.token_url.clone(),
            ..Self::default()
        }
    }
}

/// Cached OAuth2 access token
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// `FatSecret` returns a bare object instead of a one-element array when a
/// list has a single entry
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    foods: SearchFoods,
}

#[derive(Debug, Deserialize)]
struct SearchFoods {
    #[serde(default)]
    food: OneOrMany<FoodCandidate>,
}

#[derive(Debug, Deserialize)]
struct FoodEnvelope {
    food: FoodDetail,
}

#[derive(Debug, Deserialize)]
struct FoodDetail {
    #[serde(default)]
    servings: Option<FoodServings>,
}

#[derive(Debug, Deserialize)]
struct FoodServings {
    #[serde(default)]
    serving: OneOrMany<ServingVariant>,
}

/// `FatSecret` Platform API client
pub struct FatSecretClient {
    config: FatSecretClientConfig,
    http_client: reqwest::Client,
    token: Arc<RwLock<Option<CachedToken>>>,
}

impl FatSecretClient {
    /// Create a new `FatSecret` client
    #[must_use]
    pub fn new(config: FatSecretClientConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            config,
            http_client,
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Return a valid access token, requesting a new one when needed
    async fn access_token(&self) -> AppResult<String> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if Instant::now() < token.expires_at {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let (Some(client_id), Some(client_secret)) =
            (&self.config.client_id, &self.config.client_secret)
        else {
            return Err(AppError::new(
                ErrorCode::ConfigMissing,
                "FATSECRET_CLIENT_ID and FATSECRET_CLIENT_SECRET are not configured",
            ));
        };

        debug!("Requesting new FatSecret access token");
        let response = self
            .http_client
            .post(&self.config.token_url)
            .basic_auth(client_id, Some(client_secret))
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", self.config.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE_NAME, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::new(
                ErrorCode::ExternalAuthFailed,
                format!("{SERVICE_NAME}: token request failed with HTTP {status}: {text}"),
            ));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            AppError::external_service(SERVICE_NAME, format!("JSON parse error: {e}"))
        })?;

        let lifetime = token.expires_in.saturating_sub(TOKEN_REFRESH_MARGIN_SECS);
        let access_token = token.access_token;
        *self.token.write().await = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });

        Ok(access_token)
    }

    /// Call a `server.api` method and return the raw JSON body
    async fn call_method(&self, params: &[(&str, &str)]) -> AppResult<Value> {
        let access_token = self.access_token().await?;

        let response = self
            .http_client
            .get(&self.config.base_url)
            .bearer_auth(access_token)
            .query(params)
            .query(&[("format", "json")])
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE_NAME, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                self.token.write().await.take();
            }
            return Err(AppError::external_service(
                SERVICE_NAME,
                format!(
                    "HTTP {}: {}",
                    status,
                    response.text().await.unwrap_or_default()
                ),
            ));
        }

        let body: Value = response.json().await.map_err(|e| {
            AppError::external_service(SERVICE_NAME, format!("JSON parse error: {e}"))
        })?;

        if let Some(message) = api_error_message(&body) {
            if message.to_ascii_lowercase().contains("token") {
                warn!("FatSecret rejected the cached access token; it will be refreshed");
                self.token.write().await.take();
            }
            return Err(AppError::external_service(SERVICE_NAME, message));
        }

        Ok(body)
    }
}

#[async_trait]
impl NutritionSource for FatSecretClient {
    async fn search_foods(&self, query: &str) -> AppResult<Vec<FoodCandidate>> {
        if query.trim().is_empty() {
            return Err(AppError::invalid_input("Search query cannot be empty"));
        }

        let body = self
            .call_method(&[("method", "foods.search"), ("search_expression", query)])
            .await?;
        decode_search_response(body)
    }

    async fn food_servings(&self, food_id: &str) -> AppResult<Vec<ServingVariant>> {
        let body = self
            .call_method(&[("method", "food.get.v2"), ("food_id", food_id)])
            .await?;
        decode_food_response(body)
    }
}

/// Extract the message of an `{"error": {...}}` body, if present
fn api_error_message(body: &Value) -> Option<String> {
    let error = body.get("error")?;
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    let code = error.get("code").map_or_else(String::new, ToString::to_string);
    Some(if code.is_empty() {
        message.to_owned()
    } else {
        format!("error {code}: {message}")
    })
}

fn decode<T: DeserializeOwned>(body: Value) -> AppResult<T> {
    serde_json::from_value(body).map_err(|e| {
        AppError::external_service(SERVICE_NAME, format!("Unexpected response shape: {e}"))
    })
}

/// Decode a `foods.search` body into candidates, best match first
fn decode_search_response(body: Value) -> AppResult<Vec<FoodCandidate>> {
    let envelope: SearchEnvelope = decode(body)?;
    Ok(envelope.foods.food.into_vec())
}

/// Decode a `food.get.v2` body into its serving variants
fn decode_food_response(body: Value) -> AppResult<Vec<ServingVariant>> {
    let envelope: FoodEnvelope = decode(body)?;
    Ok(envelope
        .food
        .servings
        .map(|servings| servings.serving.into_vec())
        .unwrap_or_default())
}

// ABOUTME: Client for the receipt OCR microservice
// ABOUTME: Uploads an image as multipart form data and returns the recognized text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::TextRecognizer;
use crate::config::OcrConfig;
use crate::errors::{AppError, AppResult};

const SERVICE_NAME: &str = "OCR service";

/// OCR client configuration
#[derive(Debug, Clone)]
pub struct OcrClientConfig {
    /// Base URL of the OCR service (default: <http://localhost:5001>)
    pub service_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OcrClientConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:5001".to_owned(),
            timeout_secs: 60,
        }
    }
}

impl From<&OcrConfig> for OcrClientConfig {
    fn from(config: &OcrConfig) -> Self {
        Self {
            service_url: config.service_url.clone(),
            ..Self::default()
        }
    }
}

/// `POST /ocr` response body
#[derive(Debug, Deserialize)]
struct OcrResponse {
    success: bool,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the OCR microservice
pub struct OcrClient {
    config: OcrClientConfig,
    http_client: reqwest::Client,
}

impl OcrClient {
    /// Create a new OCR client
    #[must_use]
    pub fn new(config: OcrClientConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            config,
            http_client,
        }
    }
}

#[async_trait]
impl TextRecognizer for OcrClient {
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    async fn recognize(
        &self,
        image: Bytes,
        file_name: &str,
        content_type: &str,
    ) -> AppResult<String> {
        let part = Part::bytes(image.to_vec())
            .file_name(file_name.to_owned())
            .mime_str(content_type)
            .map_err(|e| AppError::invalid_input(format!("Invalid content type: {e}")))?;
        let form = Form::new().part("file", part);

        let url = format!("{}/ocr", self.config.service_url.trim_end_matches('/'));
        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE_NAME, e.to_string()))?;

        let status = response.status();
        let body: OcrResponse = response.json().await.map_err(|e| {
            AppError::external_service(
                SERVICE_NAME,
                format!("HTTP {status}: JSON parse error: {e}"),
            )
        })?;

        if !body.success {
            return Err(AppError::external_service(
                SERVICE_NAME,
                body.error
                    .unwrap_or_else(|| "Failed to process image".to_owned()),
            ));
        }

        let text = body.text.unwrap_or_default();
        debug!(chars = text.len(), "OCR text extracted");
        Ok(text)
    }
}

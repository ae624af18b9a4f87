// ABOUTME: Receipt analysis: OCR text extraction followed by LLM ingredient identification
// ABOUTME: Returns the identified ingredients together with the raw OCR text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::errors::{AppError, AppResult, ErrorCode};
use crate::external::TextRecognizer;
use crate::llm::{ChatRequest, LlmProvider};
use crate::recipes::parsing::decode_strict;
use crate::recipes::prompts::receipt_messages;

const RECEIPT_TEMPERATURE: f32 = 0.3;

/// Ingredients found on a receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptAnalysis {
    /// Ingredient names found on the receipt
    pub ingredients: Vec<String>,
    /// OCR output the ingredients were read from
    #[serde(rename = "rawText")]
    pub raw_text: String,
}

/// Turns receipt images into ingredient lists
pub struct ReceiptAnalyzer {
    ocr: Arc<dyn TextRecognizer>,
    llm: Arc<dyn LlmProvider>,
    model: Option<String>,
}

fn analysis_error(message: impl Into<String>) -> AppError {
    AppError::new(ErrorCode::ReceiptAnalysisError, message)
}

impl ReceiptAnalyzer {
    /// Create an analyzer; `model` overrides the provider default
    #[must_use]
    pub fn new(
        ocr: Arc<dyn TextRecognizer>,
        llm: Arc<dyn LlmProvider>,
        model: Option<String>,
    ) -> Self {
        Self { ocr, llm, model }
    }

    /// Extract text from the image and ask the model which items are food
    ///
    /// Blank OCR output short-circuits to an empty ingredient list.
    ///
    /// # Errors
    ///
    /// `RECEIPT_ANALYSIS_ERROR` when OCR fails, the model call fails, or the
    /// model does not answer with a JSON array of strings.
    #[instrument(skip(self, image), fields(file_name = %file_name, bytes = image.len()))]
    pub async fn analyze(
        &self,
        image: Bytes,
        file_name: &str,
        content_type: &str,
    ) -> AppResult<ReceiptAnalysis> {
        let raw_text = self
            .ocr
            .recognize(image, file_name, content_type)
            .await
            .map_err(|e| analysis_error(e.message.clone()).with_source(e))?;
        info!(chars = raw_text.len(), "Receipt OCR completed");

        if raw_text.trim().is_empty() {
            return Ok(ReceiptAnalysis {
                ingredients: Vec::new(),
                raw_text,
            });
        }

        let mut request =
            ChatRequest::new(receipt_messages(&raw_text)).with_temperature(RECEIPT_TEMPERATURE);
        if let Some(model) = &self.model {
            request = request.with_model(model.clone());
        }

        let response = self
            .llm
            .complete(&request)
            .await
            .map_err(|e| analysis_error(e.message.clone()).with_source(e))?;

        let ingredients: Vec<String> = decode_strict(&response.content).map_err(|e| {
            analysis_error(format!("Failed to parse identified ingredients: {e}"))
        })?;
        info!(count = ingredients.len(), "Receipt ingredients identified");

        Ok(ReceiptAnalysis {
            ingredients,
            raw_text,
        })
    }
}

// ABOUTME: Receipt route handler accepting an image upload for ingredient extraction
// ABOUTME: Validates the multipart part, then delegates to the receipt analyzer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use bytes::Bytes;
use tracing::info;

use crate::auth::{authenticate, AuthenticatedUser};
use crate::errors::{AppError, ErrorCode};
use crate::resources::ServerResources;
use crate::routes::ApiResponse;

/// Multipart field carrying the image
const RECEIPT_FIELD: &str = "receipt";

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Uploaded receipt image
struct ReceiptUpload {
    file_name: String,
    content_type: &'static str,
    data: Bytes,
}

/// Map a part to one of the accepted image types
fn image_content_type(content_type: Option<&str>, file_name: &str) -> Option<&'static str> {
    match content_type.map(str::to_ascii_lowercase).as_deref() {
        Some("image/jpeg" | "image/jpg") => return Some("image/jpeg"),
        Some("image/png") => return Some("image/png"),
        _ => {}
    }

    let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

fn too_large(max_bytes: usize) -> AppError {
    AppError::new(
        ErrorCode::PayloadTooLarge,
        format!("Receipt image exceeds the {max_bytes} byte limit"),
    )
}

fn multipart_error(error: &MultipartError, max_bytes: usize) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(max_bytes)
    } else {
        AppError::invalid_input(format!("Invalid multipart body: {}", error.body_text()))
    }
}

/// Receipt routes
pub struct ReceiptRoutes;

impl ReceiptRoutes {
    /// Create all receipt routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        let body_limit = resources.config.ocr.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

        Router::new()
            .route("/api/receipt/analyze", post(Self::handle_analyze))
            .layer(DefaultBodyLimit::max(body_limit))
            .with_state(resources)
    }

    async fn authenticate(
        headers: &HeaderMap,
        resources: &Arc<ServerResources>,
    ) -> Result<AuthenticatedUser, AppError> {
        authenticate(headers, resources.identity.as_ref()).await
    }

    /// Read the `receipt` part, skipping any other fields
    async fn read_upload(
        multipart: &mut Multipart,
        max_bytes: usize,
    ) -> Result<Option<ReceiptUpload>, AppError> {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(&e, max_bytes))?
        {
            if field.name() != Some(RECEIPT_FIELD) {
                continue;
            }

            let file_name = field.file_name().unwrap_or("receipt").to_owned();
            let content_type = image_content_type(field.content_type(), &file_name)
                .ok_or_else(|| AppError::invalid_input("Only JPG and PNG images are allowed"))?;

            let data = field
                .bytes()
                .await
                .map_err(|e| multipart_error(&e, max_bytes))?;
            if data.len() > max_bytes {
                return Err(too_large(max_bytes));
            }

            return Ok(Some(ReceiptUpload {
                file_name,
                content_type,
                data,
            }));
        }

        Ok(None)
    }

    /// Analyze an uploaded receipt image
    async fn handle_analyze(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        mut multipart: Multipart,
    ) -> Result<Response, AppError> {
        let user = Self::authenticate(&headers, &resources).await?;

        let max_bytes = resources.config.ocr.max_upload_bytes;
        let upload = Self::read_upload(&mut multipart, max_bytes)
            .await?
            .filter(|upload| !upload.data.is_empty())
            .ok_or_else(|| AppError::invalid_input("No receipt image provided"))?;

        info!(
            user_id = %user.uid,
            file_name = %upload.file_name,
            bytes = upload.data.len(),
            "Analyzing receipt image"
        );

        let analysis = resources
            .receipt_analyzer
            .analyze(upload.data, &upload.file_name, upload.content_type)
            .await?;

        Ok(ApiResponse::data(analysis).into_response())
    }
}

// ABOUTME: JSON success envelope returned by every API handler
// ABOUTME: Pairs with the AppError body so clients branch on the success flag
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// `{"success": true, "data": ...}` or `{"success": true, "message": ...}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// `true` for successful responses
    pub success: bool,
    /// Payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap a payload
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// Render with the given status code
    pub fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl ApiResponse<()> {
    /// Acknowledge an action that has no payload
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        self.with_status(StatusCode::OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shapes() {
        let data = serde_json::to_value(ApiResponse::data(json!({"recipe_id": "r1"}))).unwrap();
        assert_eq!(data, json!({"success": true, "data": {"recipe_id": "r1"}}));

        let message = serde_json::to_value(ApiResponse::message("Logged out successfully")).unwrap();
        assert_eq!(
            message,
            json!({"success": true, "message": "Logged out successfully"})
        );
    }
}

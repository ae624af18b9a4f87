// ABOUTME: HTTP integration tests for receipt upload and analysis
// ABOUTME: Covers multipart validation, size limits and the OCR plus model flow
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::sync::Arc;

use axum::http::StatusCode;
use common::TestServices;
use helpers::axum_test::AxumTestRequest;
use helpers::mocks::{MockIdentity, MockLlm, MockNutrition, MockOcr};
use mealwise_server::resources::ServerResources;
use serde_json::{json, Value};

const RECEIPT_TEXT: &str = "MART 24\n두부 1 2,500\nEGGS 12CT 4.99\nBATTERIES AA 7.99\n";

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-data";

async fn resources(ocr: Arc<MockOcr>, llm: Arc<MockLlm>) -> Arc<ServerResources> {
    common::create_test_resources(TestServices {
        identity: Arc::new(MockIdentity::new().with_user("tok", "alice", "alice@example.com")),
        llm,
        nutrition: Arc::new(MockNutrition::new()),
        ocr,
    })
    .await
}

#[tokio::test]
async fn test_analyze_receipt_returns_ingredients_and_raw_text() {
    let ocr = Arc::new(MockOcr::returning(RECEIPT_TEXT));
    let llm = Arc::new(MockLlm::replying(&[r#"["두부 (tofu)", "eggs"]"#]));
    let resources = resources(ocr.clone(), llm.clone()).await;

    let body: Value = AxumTestRequest::post("/api/receipt/analyze")
        .bearer("tok")
        .multipart_file("receipt", "receipt.png", "image/png", PNG_BYTES)
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::OK)
        .json();

    assert_eq!(
        body["data"],
        json!({"ingredients": ["두부 (tofu)", "eggs"], "rawText": RECEIPT_TEXT})
    );
    assert_eq!(
        ocr.calls(),
        vec![("receipt.png".to_owned(), "image/png".to_owned(), PNG_BYTES.len())]
    );

    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].temperature, Some(0.3));
    assert!(requests[0].messages.iter().any(|m| m.content == RECEIPT_TEXT));
}

#[tokio::test]
async fn test_jpeg_detected_from_extension() {
    let ocr = Arc::new(MockOcr::returning(RECEIPT_TEXT));
    let llm = Arc::new(MockLlm::replying(&[r#"["eggs"]"#]));
    let resources = resources(ocr.clone(), llm).await;

    AxumTestRequest::post("/api/receipt/analyze")
        .bearer("tok")
        .multipart_file("receipt", "scan.JPG", "application/octet-stream", b"jpeg-bytes")
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::OK);

    assert_eq!(ocr.calls()[0].1, "image/jpeg");
}

#[tokio::test]
async fn test_missing_receipt_field_is_bad_request() {
    let ocr = Arc::new(MockOcr::returning(RECEIPT_TEXT));
    let resources = resources(ocr.clone(), Arc::new(MockLlm::replying(&[]))).await;

    let body: Value = AxumTestRequest::post("/api/receipt/analyze")
        .bearer("tok")
        .multipart_file("photo", "receipt.png", "image/png", PNG_BYTES)
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();

    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    assert_eq!(body["error"]["message"], "No receipt image provided");
    assert!(ocr.calls().is_empty());
}

#[tokio::test]
async fn test_unsupported_image_type_is_rejected() {
    let ocr = Arc::new(MockOcr::returning(RECEIPT_TEXT));
    let resources = resources(ocr.clone(), Arc::new(MockLlm::replying(&[]))).await;

    AxumTestRequest::post("/api/receipt/analyze")
        .bearer("tok")
        .multipart_file("receipt", "receipt.gif", "image/gif", b"GIF89a")
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    assert!(ocr.calls().is_empty());
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let ocr = Arc::new(MockOcr::returning(RECEIPT_TEXT));
    let resources = resources(ocr.clone(), Arc::new(MockLlm::replying(&[]))).await;
    // Test config allows 1024 bytes
    let image = vec![0_u8; 4096];

    let body: Value = AxumTestRequest::post("/api/receipt/analyze")
        .bearer("tok")
        .multipart_file("receipt", "receipt.png", "image/png", &image)
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE)
        .json();

    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
    assert!(ocr.calls().is_empty());
}

#[tokio::test]
async fn test_ocr_failure_is_receipt_analysis_error() {
    let resources = resources(
        Arc::new(MockOcr::failing()),
        Arc::new(MockLlm::replying(&[])),
    )
    .await;

    let body: Value = AxumTestRequest::post("/api/receipt/analyze")
        .bearer("tok")
        .multipart_file("receipt", "receipt.png", "image/png", PNG_BYTES)
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .json();

    assert_eq!(body["error"]["code"], "RECEIPT_ANALYSIS_ERROR");
}

#[tokio::test]
async fn test_non_array_model_answer_is_receipt_analysis_error() {
    let resources = resources(
        Arc::new(MockOcr::returning(RECEIPT_TEXT)),
        Arc::new(MockLlm::replying(&["The receipt contains eggs and tofu."])),
    )
    .await;

    let body: Value = AxumTestRequest::post("/api/receipt/analyze")
        .bearer("tok")
        .multipart_file("receipt", "receipt.png", "image/png", PNG_BYTES)
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .json();

    assert_eq!(body["error"]["code"], "RECEIPT_ANALYSIS_ERROR");
}

#[tokio::test]
async fn test_blank_ocr_text_skips_model() {
    let llm = Arc::new(MockLlm::replying(&[]));
    let resources = resources(Arc::new(MockOcr::returning("  \n ")), llm.clone()).await;

    let body: Value = AxumTestRequest::post("/api/receipt/analyze")
        .bearer("tok")
        .multipart_file("receipt", "receipt.png", "image/png", PNG_BYTES)
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::OK)
        .json();

    assert_eq!(body["data"]["ingredients"], json!([]));
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_receipt_requires_authentication() {
    let resources = resources(
        Arc::new(MockOcr::returning(RECEIPT_TEXT)),
        Arc::new(MockLlm::replying(&[])),
    )
    .await;

    AxumTestRequest::post("/api/receipt/analyze")
        .multipart_file("receipt", "receipt.png", "image/png", PNG_BYTES)
        .send(common::test_router(&resources))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

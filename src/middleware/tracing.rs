// ABOUTME: Request tracing middleware for correlation and structured logging
// ABOUTME: Generates request ids, opens a span per request and bounds request handling time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::time::Duration;

use axum::body::Body;
use axum::Router;
use http::{HeaderName, Request, StatusCode};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{info_span, Level, Span};

/// Header carrying the request correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Upper bound for a single request; recipe generation makes N+2 sequential
/// upstream calls
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Create the span recorded for every HTTP request
fn make_request_span<B>(request: &Request<B>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}

/// Wrap a router with request id generation, tracing and a timeout
///
/// Layers run outermost first: the request id is assigned before the trace
/// span is created so the span can record it.
#[must_use]
pub fn apply_request_layers(router: Router) -> Router {
    let header = HeaderName::from_static(REQUEST_ID_HEADER);

    router
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
        .layer(PropagateRequestIdLayer::new(header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_request_span::<Body>)
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(header, MakeRequestUuid))
}

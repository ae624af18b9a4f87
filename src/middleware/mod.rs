// ABOUTME: HTTP middleware for CORS, request tracing, request ids and body limits
// ABOUTME: Assembles the tower layers applied to every route
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// CORS configuration
pub mod cors;

/// Request tracing and correlation layers
pub mod tracing;

pub use cors::setup_cors;
pub use self::tracing::{apply_request_layers, REQUEST_ID_HEADER};

// ABOUTME: Re-exports the unified error types from the mealwise-core crate
// ABOUTME: Lets server modules import errors through `crate::errors` like every other layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! The error types live in `mealwise-core` so the storage layer, the external
//! clients and the HTTP layer agree on one `AppError`. This module re-exports
//! them under the path the rest of the server uses.

pub use mealwise_core::errors::{
    AppError, AppResult, ErrorCode, ErrorResponse, ErrorResponseDetails,
};

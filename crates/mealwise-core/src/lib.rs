// ABOUTME: Core types for the Mealwise recipe and meal-planning server
// ABOUTME: Foundation crate with unified error handling and the JSON failure envelope
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Mealwise Core
//!
//! Foundation crate providing the error types shared by the HTTP layer, the
//! recipe pipeline, the storage layer and the external service clients.
//! Kept separate so it changes rarely and compiles once.

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Exposes the environment-driven ServerConfig and its typed sections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module for the Mealwise server
//!
//! All configuration is read from environment variables at startup. There is
//! no configuration file.

/// Environment and server configuration
pub mod environment;

pub use environment::{
    CorsConfig, DatabaseConfig, DatabaseUrl, Environment, FirebaseConfig, LlmConfig,
    NutritionConfig, OcrConfig, ServerConfig,
};

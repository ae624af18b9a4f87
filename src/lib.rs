// ABOUTME: Main library entry point for the Mealwise recipe and meal planning API
// ABOUTME: LLM recipe generation with nutrition lookup, receipt analysis and meal plans
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Mealwise Server
//!
//! A REST backend for recipe generation and meal planning.
//!
//! ## Features
//!
//! - **Recipe generation**: a language model drafts a recipe skeleton, each
//!   ingredient is looked up in the FatSecret nutrition database, and the
//!   model aggregates per-serving nutrition facts from that data
//! - **Receipt analysis**: OCR text from a receipt photo is turned into an
//!   ingredient list
//! - **Meal plans, bookmarks and feedback** stored in `SQLite`
//! - **Firebase authentication** with bearer ID tokens
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use mealwise_server::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Mealwise configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Identity provider integration and request authentication
pub mod auth;

/// Environment-driven configuration
pub mod config;

/// `SQLite` storage for profiles, recipes, feedback and meal plans
pub mod database;

/// Unified error handling
pub mod errors;

/// Clients for the nutrition database and the OCR service
pub mod external;

/// Language model provider abstraction
pub mod llm;

/// Structured logging setup
pub mod logging;

/// `HTTP` middleware layers
pub mod middleware;

/// Receipt image analysis
pub mod receipts;

/// Recipe generation pipeline
pub mod recipes;

/// Shared server resources
pub mod resources;

/// `HTTP` route groups
pub mod routes;

/// `HTTP` server assembly and lifecycle
pub mod server;

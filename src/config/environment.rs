// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses environment variables into typed sections and validates them at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration management for production deployment

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

/// Default HTTP port, matching the port the mobile client expects
const DEFAULT_HTTP_PORT: u16 = 8010;

/// Default `SQLite` database location
const DEFAULT_DATABASE_URL: &str = "sqlite:./data/mealwise.db";

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4";

const DEFAULT_FATSECRET_BASE_URL: &str = "https://platform.fatsecret.com/rest/server.api";
const DEFAULT_FATSECRET_TOKEN_URL: &str = "https://oauth.fatsecret.com/connect/token";

const DEFAULT_IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

const DEFAULT_OCR_SERVICE_URL: &str = "http://localhost:5001";

/// 5 MiB receipt upload limit
const DEFAULT_RECEIPT_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Environment type for logging and security decisions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Test runs
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Type-safe database location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DatabaseUrl {
    /// `SQLite` database with file path
    SQLite {
        /// Path to the database file
        path: PathBuf,
    },
    /// In-memory `SQLite` (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string; anything without the `sqlite:` prefix is a file path
    #[must_use]
    pub fn parse_url(s: &str) -> Self {
        let path_str = s.strip_prefix("sqlite:").unwrap_or(s);
        let path_str = path_str.strip_prefix("//").unwrap_or(path_str);
        if path_str == ":memory:" {
            Self::Memory
        } else {
            Self::SQLite {
                path: PathBuf::from(path_str),
            }
        }
    }

    /// Convert to connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".to_owned(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::parse_url(DEFAULT_DATABASE_URL)
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Database configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database location
    pub url: DatabaseUrl,
}

/// LLM (`OpenAI`-compatible chat completions) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key; generation and receipt analysis fail without it
    pub api_key: Option<String>,
    /// Base URL of the chat completions API
    pub base_url: String,
    /// Model used for every prompt
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_owned(),
            model: DEFAULT_OPENAI_MODEL.to_owned(),
        }
    }
}

/// `FatSecret` nutrition database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionConfig {
    /// OAuth client id
    pub client_id: Option<String>,
    /// OAuth client secret
    pub client_secret: Option<String>,
    /// REST endpoint (`server.api`)
    pub base_url: String,
    /// OAuth token endpoint
    pub token_url: String,
    /// Ingredient lookups in flight at once (1 = sequential)
    pub lookup_concurrency: usize,
}

impl NutritionConfig {
    /// Both client credentials are present
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}

impl Default for NutritionConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            base_url: DEFAULT_FATSECRET_BASE_URL.to_owned(),
            token_url: DEFAULT_FATSECRET_TOKEN_URL.to_owned(),
            lookup_concurrency: 1,
        }
    }
}

/// Firebase Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseConfig {
    /// Firebase project ID (required for token validation)
    pub project_id: Option<String>,
    /// Web API key (required for account registration)
    pub api_key: Option<String>,
    /// Whether Firebase authentication is enabled
    pub enabled: bool,
    /// Identity Toolkit REST base URL
    pub identity_toolkit_url: String,
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            api_key: None,
            enabled: false,
            identity_toolkit_url: DEFAULT_IDENTITY_TOOLKIT_URL.to_owned(),
        }
    }
}

impl FirebaseConfig {
    /// Returns `true` if Firebase is enabled and has a project ID configured
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.enabled && self.project_id.is_some()
    }
}

/// OCR microservice configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Base URL of the OCR service
    pub service_url: String,
    /// Largest accepted receipt upload in bytes
    pub max_upload_bytes: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_OCR_SERVICE_URL.to_owned(),
            max_upload_bytes: DEFAULT_RECEIPT_MAX_BYTES,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated origin list, or `*`
    pub allowed_origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: "*".to_owned(),
        }
    }
}

/// Complete server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Database configuration
    pub database: DatabaseConfig,
    /// LLM configuration
    pub llm: LlmConfig,
    /// Nutrition database configuration
    pub nutrition: NutritionConfig,
    /// Firebase configuration
    pub firebase: FirebaseConfig,
    /// OCR service configuration
    pub ocr: OcrConfig,
    /// CORS configuration
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            environment: Environment::default(),
            database: DatabaseConfig::default(),
            llm: LlmConfig::default(),
            nutrition: NutritionConfig::default(),
            firebase: FirebaseConfig::default(),
            ocr: OcrConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed, or if
    /// the resulting configuration fails validation.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let http_port = env::var("HTTP_PORT")
            .or_else(|_| env::var("PORT"))
            .map_or(Ok(DEFAULT_HTTP_PORT), |port| {
                port.parse().context("Invalid HTTP_PORT value")
            })?;

        let firebase_project_id = non_empty_var("FIREBASE_PROJECT_ID");
        let firebase_enabled: bool = env_var_or("FIREBASE_AUTH_ENABLED", "true")
            .parse()
            .context("Invalid FIREBASE_AUTH_ENABLED value")?;

        let config = Self {
            http_port,
            environment: Environment::from_str_or_default(&env_var_or(
                "ENVIRONMENT",
                "development",
            )),

            database: DatabaseConfig {
                url: DatabaseUrl::parse_url(&env_var_or("DATABASE_URL", DEFAULT_DATABASE_URL)),
            },

            llm: LlmConfig {
                api_key: non_empty_var("OPENAI_API_KEY"),
                base_url: env_var_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
                model: env_var_or("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            },

            nutrition: NutritionConfig {
                client_id: non_empty_var("FATSECRET_CLIENT_ID"),
                client_secret: non_empty_var("FATSECRET_CLIENT_SECRET"),
                base_url: env_var_or("FATSECRET_BASE_URL", DEFAULT_FATSECRET_BASE_URL),
                token_url: env_var_or("FATSECRET_TOKEN_URL", DEFAULT_FATSECRET_TOKEN_URL),
                lookup_concurrency: env_var_or("NUTRITION_LOOKUP_CONCURRENCY", "1")
                    .parse()
                    .context("Invalid NUTRITION_LOOKUP_CONCURRENCY value")?,
            },

            firebase: FirebaseConfig {
                enabled: firebase_enabled && firebase_project_id.is_some(),
                project_id: firebase_project_id,
                api_key: non_empty_var("FIREBASE_API_KEY"),
                identity_toolkit_url: env_var_or(
                    "FIREBASE_IDENTITY_TOOLKIT_URL",
                    DEFAULT_IDENTITY_TOOLKIT_URL,
                ),
            },

            ocr: OcrConfig {
                service_url: env_var_or("OCR_SERVICE_URL", DEFAULT_OCR_SERVICE_URL),
                max_upload_bytes: env_var_or(
                    "RECEIPT_MAX_BYTES",
                    &DEFAULT_RECEIPT_MAX_BYTES.to_string(),
                )
                .parse()
                .context("Invalid RECEIPT_MAX_BYTES value")?,
            },

            cors: CorsConfig {
                allowed_origins: env_var_or("CORS_ALLOWED_ORIGINS", "*"),
            },
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error for values the server cannot run with. Missing
    /// credentials only produce warnings because the affected endpoints
    /// report their own errors.
    pub fn validate(&self) -> Result<()> {
        if self.nutrition.lookup_concurrency == 0 {
            return Err(anyhow::anyhow!(
                "NUTRITION_LOOKUP_CONCURRENCY must be at least 1"
            ));
        }

        if self.ocr.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("RECEIPT_MAX_BYTES must be greater than 0"));
        }

        if self.llm.api_key.is_none() {
            warn!("OPENAI_API_KEY is not set; recipe generation and receipt analysis will fail");
        }

        if !self.nutrition.is_configured() {
            warn!("FatSecret credentials are missing; recipes will be generated without nutrition lookups");
        }

        if !self.firebase.is_configured() {
            warn!("Firebase authentication is disabled or FIREBASE_PROJECT_ID is missing");
        }

        Ok(())
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Mealwise Server Configuration:\n\
             - HTTP Port: {}\n\
             - Environment: {}\n\
             - Database: {}\n\
             - LLM: {} ({})\n\
             - FatSecret: {}\n\
             - Nutrition Lookup Concurrency: {}\n\
             - Firebase Auth: {}\n\
             - OCR Service: {}\n\
             - Receipt Upload Limit: {} bytes\n\
             - CORS Origins: {}",
            self.http_port,
            self.environment,
            if self.database.url.is_memory() {
                "SQLite (in-memory)"
            } else {
                "SQLite"
            },
            self.llm.model,
            if self.llm.api_key.is_some() {
                "Enabled"
            } else {
                "Disabled"
            },
            if self.nutrition.is_configured() {
                "Enabled"
            } else {
                "Disabled"
            },
            self.nutrition.lookup_concurrency,
            if self.firebase.is_configured() {
                "Enabled"
            } else {
                "Disabled"
            },
            self.ocr.service_url,
            self.ocr.max_upload_bytes,
            self.cors.allowed_origins,
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Get environment variable, treating empty values as unset
fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

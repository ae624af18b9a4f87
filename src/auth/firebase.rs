// ABOUTME: Firebase Authentication identity provider
// ABOUTME: Validates ID tokens against Google's cached certificates and registers accounts via Identity Toolkit
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Firebase Authentication
//!
//! - ID token validation using Google's rotating X.509 certificates, cached
//!   for the `max-age` the certificate endpoint advertises
//! - Email/password registration through the Identity Toolkit REST API
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mealwise_server::auth::{FirebaseAuth, IdentityProvider};
//! use mealwise_server::config::FirebaseConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FirebaseConfig {
//!     project_id: Some("my-project".to_owned()),
//!     enabled: true,
//!     ..FirebaseConfig::default()
//! };
//! let firebase = FirebaseAuth::new(config);
//!
//! let identity = firebase.verify_id_token("eyJ...").await?;
//! println!("User: {}", identity.uid);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use x509_parser::prelude::*;

use super::{CreatedAccount, IdentityProvider, VerifiedIdentity};
use crate::config::FirebaseConfig;
use crate::errors::{AppError, AppResult, ErrorCode};

/// Google's Firebase public key endpoint
const FIREBASE_CERTS_URL: &str =
    "https://www.googleapis.com/robot/v1/metadata/x509/securetoken@system.gserviceaccount.com";

/// Firebase issuer URL template (includes project ID)
const FIREBASE_ISSUER_TEMPLATE: &str = "https://securetoken.google.com/";

const SERVICE_NAME: &str = "Firebase";

/// Minimum cache TTL in seconds (5 minutes)
const MIN_CACHE_TTL_SECS: i64 = 300;

/// Default cache TTL in seconds if Cache-Control header is missing (1 hour)
const DEFAULT_CACHE_TTL_SECS: i64 = 3600;

/// Cached Firebase public keys
struct CachedKeys {
    /// Key ID to PEM-encoded public key mapping
    keys: HashMap<String, String>,
    expires_at: DateTime<Utc>,
}

/// Firebase ID token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseClaims {
    /// Issuer (should be `https://securetoken.google.com/<project-id>`)
    pub iss: String,
    /// Audience (should be the Firebase project ID)
    pub aud: String,
    /// Subject (Firebase user UID)
    pub sub: String,
    /// Issued-at, seconds since epoch
    pub iat: i64,
    /// Expiry, seconds since epoch
    pub exp: i64,
    /// Email address
    pub email: Option<String>,
    /// Whether the provider verified the email
    pub email_verified: Option<bool>,
    /// Display name
    pub name: Option<String>,
}

impl From<FirebaseClaims> for VerifiedIdentity {
    fn from(claims: FirebaseClaims) -> Self {
        Self {
            uid: claims.sub,
            email: claims.email,
            email_verified: claims.email_verified.unwrap_or(false),
            name: claims.name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    id_token: String,
    email: String,
    local_id: String,
}

#[derive(Debug, Deserialize)]
struct IdentityToolkitError {
    error: IdentityToolkitErrorDetail,
}

#[derive(Debug, Deserialize)]
struct IdentityToolkitErrorDetail {
    message: String,
}

/// Firebase identity provider
///
/// Thread-safe via `Arc<RwLock<_>>` for concurrent access to the key cache.
pub struct FirebaseAuth {
    config: FirebaseConfig,
    http_client: Client,
    cached_keys: Arc<RwLock<Option<CachedKeys>>>,
}

impl FirebaseAuth {
    /// Create a new Firebase identity provider
    #[must_use]
    pub fn new(config: FirebaseConfig) -> Self {
        let http_client = Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            config,
            http_client,
            cached_keys: Arc::new(RwLock::new(None)),
        }
    }

    /// Check if Firebase authentication is enabled and configured
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.is_configured()
    }

    /// Validate a Firebase ID token
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Firebase is not configured
    /// - Token header cannot be decoded or has no key ID
    /// - Public key cannot be found for the token's key ID
    /// - Token signature is invalid, the token is expired, or the issuer or
    ///   audience doesn't match
    pub async fn validate_token(&self, token: &str) -> AppResult<FirebaseClaims> {
        let project_id = self
            .config
            .project_id
            .as_ref()
            .filter(|_| self.config.enabled)
            .ok_or_else(|| AppError::config("Firebase authentication is not configured"))?;

        let header = decode_header(token).map_err(|e| {
            debug!(error = %e, "Failed to decode Firebase token header");
            AppError::auth_invalid("Invalid token format")
        })?;

        let kid = header.kid.ok_or_else(|| {
            debug!("Firebase token missing key ID (kid) in header");
            AppError::auth_invalid("Token missing key ID")
        })?;

        let pem_key = self.get_public_key(&kid).await?;

        let decoding_key = DecodingKey::from_rsa_pem(pem_key.as_bytes()).map_err(|e| {
            warn!(error = %e, kid = %kid, "Failed to create decoding key from PEM");
            AppError::internal(format!("Invalid public key: {e}"))
        })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[project_id]);
        validation.set_issuer(&[format!("{FIREBASE_ISSUER_TEMPLATE}{project_id}")]);

        let token_data =
            decode::<FirebaseClaims>(token, &decoding_key, &validation).map_err(|e| {
                debug!(error = %e, "Firebase token validation failed");
                match e.kind() {
                    ErrorKind::ExpiredSignature => AppError::auth_expired(),
                    ErrorKind::InvalidAudience => AppError::auth_invalid("Invalid token audience"),
                    ErrorKind::InvalidIssuer => AppError::auth_invalid("Invalid token issuer"),
                    _ => AppError::auth_invalid("Invalid token"),
                }
            })?;

        debug!(user_id = %token_data.claims.sub, "Firebase token validated");
        Ok(token_data.claims)
    }

    /// Get the public key for a given key ID, refreshing the cache on a miss
    async fn get_public_key(&self, kid: &str) -> AppResult<String> {
        if let Some(key) = self.try_get_cached_key(kid).await {
            return Ok(key);
        }

        self.refresh_keys().await?;

        let cache = self.cached_keys.read().await;
        cache
            .as_ref()
            .and_then(|cached| cached.keys.get(kid).cloned())
            .ok_or_else(|| {
                debug!(kid = %kid, "Firebase public key not found for kid");
                AppError::auth_invalid("Unknown token signing key")
            })
    }

    async fn try_get_cached_key(&self, kid: &str) -> Option<String> {
        let cache = self.cached_keys.read().await;
        cache
            .as_ref()
            .filter(|cached| cached.expires_at > Utc::now())
            .and_then(|cached| cached.keys.get(kid).cloned())
    }

    /// Refresh the public key cache from Google's endpoint
    async fn refresh_keys(&self) -> AppResult<()> {
        info!("Fetching Firebase public keys from Google");

        let response = self
            .http_client
            .get(FIREBASE_CERTS_URL)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to fetch Firebase public keys");
                AppError::external_service(SERVICE_NAME, format!("Failed to fetch public keys: {e}"))
            })?;

        let cache_ttl = response
            .headers()
            .get("cache-control")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(DEFAULT_CACHE_TTL_SECS)
            .max(MIN_CACHE_TTL_SECS);

        let certs: HashMap<String, String> = response.json().await.map_err(|e| {
            AppError::external_service(SERVICE_NAME, format!("Failed to parse public keys: {e}"))
        })?;

        let keys = convert_certs_to_keys(certs)?;
        let expires_at = Utc::now() + Duration::seconds(cache_ttl);
        info!(
            num_keys = keys.len(),
            cache_ttl_secs = cache_ttl,
            "Firebase public keys cached"
        );

        *self.cached_keys.write().await = Some(CachedKeys { keys, expires_at });
        Ok(())
    }

    fn identity_toolkit_url(&self, endpoint: &str) -> AppResult<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::config("FIREBASE_API_KEY is not configured"))?;
        Ok(format!(
            "{}/{endpoint}?key={api_key}",
            self.config.identity_toolkit_url.trim_end_matches('/')
        ))
    }

    /// Set the display name of a freshly created account
    async fn update_display_name(&self, id_token: &str, display_name: &str) -> AppResult<()> {
        let response = self
            .http_client
            .post(self.identity_toolkit_url("accounts:update")?)
            .json(&json!({
                "idToken": id_token,
                "displayName": display_name,
                "returnSecureToken": false,
            }))
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE_NAME, e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(map_identity_toolkit_error(&body))
        }
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn verify_id_token(&self, token: &str) -> AppResult<VerifiedIdentity> {
        Ok(self.validate_token(token).await?.into())
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> AppResult<CreatedAccount> {
        let response = self
            .http_client
            .post(self.identity_toolkit_url("accounts:signUp")?)
            .json(&json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE_NAME, e.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_identity_toolkit_error(&body));
        }

        let created: SignUpResponse = response.json().await.map_err(|e| {
            AppError::external_service(SERVICE_NAME, format!("JSON parse error: {e}"))
        })?;

        let display_name = match display_name {
            Some(name) => match self.update_display_name(&created.id_token, name).await {
                Ok(()) => Some(name.to_owned()),
                Err(e) => {
                    warn!(uid = %created.local_id, error = %e, "Failed to set display name");
                    None
                }
            },
            None => None,
        };

        info!(uid = %created.local_id, "Firebase account created");
        Ok(CreatedAccount {
            uid: created.local_id,
            email: created.email,
            display_name,
            id_token: created.id_token,
        })
    }
}

/// Map an Identity Toolkit error body to an application error
fn map_identity_toolkit_error(body: &str) -> AppError {
    let Ok(parsed) = serde_json::from_str::<IdentityToolkitError>(body) else {
        return AppError::external_service(SERVICE_NAME, body.chars().take(200).collect::<String>());
    };

    let message = parsed.error.message;
    // Messages look like "WEAK_PASSWORD : Password should be at least 6 characters"
    let reason = message.split(':').next().unwrap_or_default().trim();
    match reason {
        "EMAIL_EXISTS" => AppError::new(
            ErrorCode::ResourceAlreadyExists,
            "The email address is already in use",
        ),
        "INVALID_EMAIL" => AppError::invalid_input("The email address is invalid"),
        "WEAK_PASSWORD" | "MISSING_PASSWORD" => AppError::invalid_input(message.clone()),
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_NOT_FOUND" => {
            AppError::auth_invalid(message.clone())
        }
        _ => AppError::external_service(SERVICE_NAME, message.clone()),
    }
}

/// Convert X.509 certificates to PEM-encoded public keys
fn convert_certs_to_keys(certs: HashMap<String, String>) -> AppResult<HashMap<String, String>> {
    let mut keys = HashMap::with_capacity(certs.len());
    for (kid, cert_pem) in certs {
        match extract_public_key_from_cert(&cert_pem) {
            Ok(public_key_pem) => {
                keys.insert(kid, public_key_pem);
            }
            Err(e) => {
                warn!(kid = %kid, error = %e, "Failed to extract public key from certificate");
            }
        }
    }

    if keys.is_empty() {
        return Err(AppError::external_service(
            SERVICE_NAME,
            "No valid public keys found",
        ));
    }

    Ok(keys)
}

/// Parse max-age value from Cache-Control header
///
/// Example: "public, max-age=3600, must-revalidate" -> 3600
fn parse_max_age(cache_control: &str) -> Option<i64> {
    cache_control
        .split(',')
        .map(str::trim)
        .find_map(|s| s.strip_prefix("max-age="))
        .and_then(|s| s.parse().ok())
}

/// Extract the SPKI public key from a PEM X.509 certificate
fn extract_public_key_from_cert(cert_pem: &str) -> AppResult<String> {
    let (_, pem) = parse_x509_pem(cert_pem.as_bytes())
        .map_err(|e| AppError::internal(format!("Failed to parse X.509 PEM: {e}")))?;

    let (_, cert) = X509Certificate::from_der(&pem.contents)
        .map_err(|e| AppError::internal(format!("Failed to parse X.509 certificate: {e}")))?;

    let encoded = STANDARD.encode(cert.public_key().raw);
    let body = encoded
        .as_bytes()
        .chunks(64)
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!(
        "-----BEGIN PUBLIC KEY-----\n{body}\n-----END PUBLIC KEY-----"
    ))
}

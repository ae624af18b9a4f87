// ABOUTME: Caller authentication backed by an external identity provider
// ABOUTME: Parses bearer tokens and resolves them to an AuthenticatedUser
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Authentication
//!
//! Accounts live in Firebase. The server never sees passwords except when it
//! forwards a registration to the Identity Toolkit API; every other request
//! carries a Firebase ID token in the `Authorization: Bearer` header which is
//! verified through [`IdentityProvider::verify_id_token`].

/// Firebase ID token validation and account creation
pub mod firebase;

pub use firebase::{FirebaseAuth, FirebaseClaims};

use async_trait::async_trait;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{AppError, AppResult, ErrorCode};

/// Identity established from a verified ID token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    /// Provider user id
    pub uid: String,
    /// Email address, if the account has one
    pub email: Option<String>,
    /// Whether the provider has verified the email address
    pub email_verified: bool,
    /// Display name, if set
    pub name: Option<String>,
}

/// Result of a successful account registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedAccount {
    /// Provider user id
    pub uid: String,
    /// Registered email address
    pub email: String,
    /// Display name stored on the account
    pub display_name: Option<String>,
    /// ID token for the new session
    pub id_token: String,
}

/// External identity service
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify an ID token and return the identity it was issued for
    async fn verify_id_token(&self, token: &str) -> AppResult<VerifiedIdentity>;

    /// Register a new email/password account
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> AppResult<CreatedAccount>;
}

/// Authenticated caller attached to protected requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Provider user id
    pub uid: String,
    /// Email address, if known
    pub email: Option<String>,
    /// Whether the email address is verified
    pub email_verified: bool,
}

impl From<VerifiedIdentity> for AuthenticatedUser {
    fn from(identity: VerifiedIdentity) -> Self {
        Self {
            uid: identity.uid,
            email: identity.email,
            email_verified: identity.email_verified,
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
///
/// # Errors
///
/// Returns `AUTH_REQUIRED` when the header is missing or not a bearer token.
pub fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::new(ErrorCode::AuthRequired, "No token provided"))
}

/// Resolve the caller of a protected request
///
/// # Errors
///
/// Returns `AUTH_REQUIRED` without a bearer token and `AUTH_INVALID` or
/// `AUTH_EXPIRED` when the provider rejects it.
pub async fn authenticate(
    headers: &HeaderMap,
    provider: &dyn IdentityProvider,
) -> AppResult<AuthenticatedUser> {
    let token = bearer_token(headers)?;
    let identity = provider
        .verify_id_token(token)
        .await
        .inspect_err(|e| debug!(error = %e, "ID token verification failed"))?;
    Ok(identity.into())
}

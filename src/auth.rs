// ABOUTME: JWT-based authentication and password hashing
// ABOUTME: Token generation/validation plus bcrypt credential helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

//! # Authentication
//!
//! Bearer-token authentication for the HTTP surface. The route layer
//! validates a token exactly once per request and resolves it into a full
//! `User`; everything below the routes trusts that resolved caller identity
//! and never re-validates tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::User;

/// JWT claims carried by an AgriLink bearer token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user ID
    pub sub: String,
    /// Login handle, for log correlation
    pub email: String,
    /// Issued-at (Unix seconds)
    pub iat: i64,
    /// Expiry (Unix seconds)
    pub exp: i64,
}

/// The authenticated caller resolved from a bearer token
#[derive(Debug, Clone, Copy)]
pub struct AuthResult {
    /// Authenticated user ID
    pub user_id: Uuid,
}

/// Token issuing and validation manager
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_hours: i64,
}

impl AuthManager {
    /// Create a new auth manager from the shared secret
    #[must_use]
    pub fn new(jwt_secret: &[u8], expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret),
            decoding_key: DecodingKey::from_secret(jwt_secret),
            expiry_hours,
        }
    }

    /// Generate a bearer token for a user
    ///
    /// # Errors
    ///
    /// Returns an internal error if token signing fails
    pub fn generate_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.expiry_hours)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))
    }

    /// Validate a bearer token and resolve the caller identity
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` for expired, malformed, or mis-signed tokens
    pub fn validate_token(&self, token: &str) -> AppResult<AuthResult> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::auth_invalid(format!("Invalid token: {e}")))?;

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::auth_invalid("Token subject is not a valid user ID"))?;

        Ok(AuthResult { user_id })
    }

    /// Extract and validate the token from an `Authorization` header value
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` when the header is absent and `AuthInvalid`
    /// when it is not a valid bearer token.
    pub fn authenticate_header(&self, auth_header: Option<&str>) -> AppResult<AuthResult> {
        let header = auth_header.ok_or_else(AppError::auth_required)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::auth_invalid("Authorization header must be a bearer token"))?;
        self.validate_token(token)
    }
}

/// Hash a password for storage
///
/// # Errors
///
/// Returns an internal error if hashing fails
pub fn hash_password(password: &str) -> AppResult<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against its stored hash
///
/// # Errors
///
/// Returns an internal error if verification fails to run
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    bcrypt::verify(password, hash)
        .map_err(|e| AppError::internal(format!("Failed to verify password: {e}")))
}

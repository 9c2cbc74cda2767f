// ABOUTME: Registration and login HTTP routes
// ABOUTME: Creates accounts, verifies credentials, and issues bearer tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{optional_point, profile::ProfileResponse};
use crate::auth::{hash_password, verify_password};
use crate::database::IdentityManager;
use crate::errors::AppError;
use crate::models::User;
use crate::resources::ServerResources;

/// Minimum accepted password length
const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    name: String,
    email: String,
    password: String,
    longitude: Option<f64>,
    latitude: Option<f64>,
    #[serde(default)]
    crops: Vec<String>,
    expertise: Option<String>,
    #[serde(default)]
    equipment: Vec<String>,
    #[serde(default)]
    experience: u32,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    user: ProfileResponse,
}

/// Registration and login routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Build authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/register", post(Self::register))
            .route("/api/login", post(Self::login))
            .with_state(resources)
    }

    /// Handle POST /api/register
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for malformed fields or a duplicate email
    async fn register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RegisterRequest>,
    ) -> Result<Response, AppError> {
        let name = request.name.trim();
        let email = request.email.trim().to_lowercase();

        if name.is_empty() {
            return Err(AppError::invalid_input("name is required"));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::invalid_input("A valid email address is required"));
        }
        if request.password.len() < MIN_PASSWORD_LENGTH {
            return Err(AppError::invalid_input(
                "Password must be at least 6 characters",
            ));
        }

        let location = optional_point(request.longitude, request.latitude)?;
        let password_hash = hash_password(&request.password)?;

        let user = User {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            email,
            password_hash,
            location,
            crops: request.crops,
            expertise: request.expertise,
            equipment: request.equipment,
            experience: request.experience,
            created_at: Utc::now(),
        };

        let identities = IdentityManager::new(resources.database.pool());
        identities.create_user(&user).await?;

        let token = resources.auth.generate_token(&user)?;
        info!(user_id = %user.id, "registered new user");

        Ok((
            StatusCode::CREATED,
            Json(AuthResponse {
                token,
                user: ProfileResponse::from_user(&user),
            }),
        )
            .into_response())
    }

    /// Handle POST /api/login
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` for unknown emails and wrong passwords alike;
    /// the response never reveals which one failed.
    async fn login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> Result<Response, AppError> {
        let email = request.email.trim().to_lowercase();

        let identities = IdentityManager::new(resources.database.pool());
        let user = identities
            .get_user_by_email(&email)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Invalid email or password"))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::auth_invalid("Invalid email or password"));
        }

        let token = resources.auth.generate_token(&user)?;
        info!(user_id = %user.id, "user logged in");

        Ok(Json(AuthResponse {
            token,
            user: ProfileResponse::from_user(&user),
        })
        .into_response())
    }
}

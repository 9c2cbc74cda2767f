// ABOUTME: Own-profile HTTP routes
// ABOUTME: Read and partial-update of the authenticated caller's profile
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::{authenticate, optional_point};
use crate::database::IdentityManager;
use crate::errors::AppError;
use crate::geo::GeoPoint;
use crate::models::{ProfileUpdate, User};
use crate::resources::ServerResources;

/// The caller's own profile as returned over HTTP
///
/// Includes the email (it is the owner's own record) but never the
/// credential hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub location: Option<GeoPoint>,
    pub crops: Vec<String>,
    pub expertise: Option<String>,
    pub equipment: Vec<String>,
    pub experience: u32,
    pub created_at: String,
}

impl ProfileResponse {
    pub(crate) fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            location: user.location,
            crops: user.crops.clone(),
            expertise: user.expertise.clone(),
            equipment: user.equipment.clone(),
            experience: user.experience,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest {
    name: Option<String>,
    longitude: Option<f64>,
    latitude: Option<f64>,
    crops: Option<Vec<String>>,
    // Absent leaves expertise unchanged; an explicit null clears it
    #[serde(default, deserialize_with = "double_option")]
    expertise: Option<Option<String>>,
    equipment: Option<Vec<String>>,
    experience: Option<u32>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Own-profile routes
pub struct ProfileRoutes;

impl ProfileRoutes {
    /// Build profile routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/profile", get(Self::get_profile))
            .route("/api/profile", put(Self::update_profile))
            .with_state(resources)
    }

    /// Handle GET /api/profile
    ///
    /// # Errors
    ///
    /// Returns an error when authentication fails
    async fn get_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let caller = authenticate(&headers, &resources).await?;
        Ok(Json(ProfileResponse::from_user(&caller)).into_response())
    }

    /// Handle PUT /api/profile
    ///
    /// # Errors
    ///
    /// Returns an error when authentication fails or the update is invalid
    async fn update_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<UpdateProfileRequest>,
    ) -> Result<Response, AppError> {
        let caller = authenticate(&headers, &resources).await?;

        if let Some(name) = &request.name {
            if name.trim().is_empty() {
                return Err(AppError::invalid_input("name cannot be empty"));
            }
        }

        let update = ProfileUpdate {
            name: request.name,
            location: optional_point(request.longitude, request.latitude)?,
            crops: request.crops,
            expertise: request.expertise,
            equipment: request.equipment,
            experience: request.experience,
        };

        let identities = IdentityManager::new(resources.database.pool());
        let updated = identities.update_profile(caller.id, &update).await?;

        Ok((
            StatusCode::OK,
            Json(ProfileResponse::from_user(&updated)),
        )
            .into_response())
    }
}

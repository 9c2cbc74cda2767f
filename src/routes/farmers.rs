// ABOUTME: Geo-proximity farmer search HTTP routes
// ABOUTME: Resolves the search origin and filters, delegates to the identity store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{authenticate, optional_point};
use crate::database::users::{NearbyFilters, DEFAULT_SEARCH_RADIUS_METERS};
use crate::database::IdentityManager;
use crate::errors::AppError;
use crate::geo::GeoPoint;
use crate::models::NearbyFarmer;
use crate::resources::ServerResources;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FarmersQuery {
    max_distance: Option<f64>,
    crop_type: Option<String>,
    expertise: Option<String>,
    equipment: Option<String>,
    longitude: Option<f64>,
    latitude: Option<f64>,
}

/// One proximity search hit; profile attributes plus the exact distance
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FarmerResult {
    id: Uuid,
    name: String,
    location: GeoPoint,
    crops: Vec<String>,
    expertise: Option<String>,
    equipment: Vec<String>,
    experience: u32,
    distance_meters: f64,
}

impl FarmerResult {
    fn from_nearby(nearby: &NearbyFarmer, location: GeoPoint) -> Self {
        Self {
            id: nearby.user.id,
            name: nearby.user.name.clone(),
            location,
            crops: nearby.user.crops.clone(),
            expertise: nearby.user.expertise.clone(),
            equipment: nearby.user.equipment.clone(),
            experience: nearby.user.experience,
            distance_meters: nearby.distance_meters,
        }
    }
}

/// Geo-proximity farmer search routes
pub struct FarmerRoutes;

impl FarmerRoutes {
    /// Build farmer search routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/farmers", get(Self::find_nearby))
            .with_state(resources)
    }

    /// Handle GET /api/farmers
    ///
    /// The search origin is the query's coordinate pair when given, otherwise
    /// the caller's stored location. The radius defaults to 50 km. Results
    /// come back ordered by ascending distance and never include the caller.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when no origin can be resolved, a lone
    /// coordinate is given, or the radius is negative.
    async fn find_nearby(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<FarmersQuery>,
    ) -> Result<Response, AppError> {
        let caller = authenticate(&headers, &resources).await?;

        let origin = match optional_point(query.longitude, query.latitude)? {
            Some(point) => point,
            None => caller.location.ok_or_else(|| {
                AppError::invalid_input(
                    "Set a location on your profile or pass longitude and latitude",
                )
            })?,
        };

        let max_distance = query.max_distance.unwrap_or(DEFAULT_SEARCH_RADIUS_METERS);
        let filters = NearbyFilters {
            crop: query.crop_type,
            expertise: query.expertise,
            equipment: query.equipment,
        };

        let identities = IdentityManager::new(resources.database.pool());
        let nearby = identities
            .find_nearby(&origin, max_distance, &filters, caller.id)
            .await?;

        let results: Vec<FarmerResult> = nearby
            .iter()
            .filter_map(|hit| {
                hit.user
                    .location
                    .map(|location| FarmerResult::from_nearby(hit, location))
            })
            .collect();

        Ok(Json(results).into_response())
    }
}

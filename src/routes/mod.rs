// ABOUTME: Route module organization for AgriLink HTTP endpoints
// ABOUTME: Assembles domain routers and resolves the authenticated caller per request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

//! Route module for the AgriLink server
//!
//! Routes are organized by domain. Handlers are thin: they authenticate,
//! validate the request shape, and delegate to the storage managers.

/// Registration and login routes
pub mod auth;
/// Conversation registry routes
pub mod conversations;
/// Diagnosis and community feed routes
pub mod diagnosis;
/// Geo-proximity farmer search routes
pub mod farmers;
/// Health check routes
pub mod health;
/// Message log routes
pub mod messages;
/// Own-profile routes
pub mod profile;

use std::sync::Arc;

use axum::{http::HeaderMap, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::database::IdentityManager;
use crate::errors::{AppError, AppResult};
use crate::geo::GeoPoint;
use crate::models::User;
use crate::resources::ServerResources;

/// Build the complete application router
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(auth::AuthRoutes::routes(resources.clone()))
        .merge(profile::ProfileRoutes::routes(resources.clone()))
        .merge(farmers::FarmerRoutes::routes(resources.clone()))
        .merge(conversations::ConversationRoutes::routes(resources.clone()))
        .merge(messages::MessageRoutes::routes(resources.clone()))
        .merge(diagnosis::DiagnosisRoutes::routes(resources.clone()))
        .merge(health::HealthRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Resolve the authenticated caller from the request headers
///
/// Validates the bearer token once and loads the full user record; the
/// domain layer below receives this resolved identity and never touches
/// tokens.
///
/// # Errors
///
/// Returns `AuthRequired`/`AuthInvalid` for missing or bad tokens, and
/// `AuthInvalid` when the token's subject no longer exists.
pub(crate) async fn authenticate(
    headers: &HeaderMap,
    resources: &Arc<ServerResources>,
) -> AppResult<User> {
    let auth_header = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok());

    let auth = resources.auth.authenticate_header(auth_header)?;

    let identities = IdentityManager::new(resources.database.pool());
    identities
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::auth_invalid("User no longer exists"))
}

/// Build a point from optional longitude/latitude request fields
///
/// Coordinates travel together: a request giving only one of the pair is
/// malformed.
///
/// # Errors
///
/// Returns `InvalidInput` for a lone coordinate or out-of-range values.
pub(crate) fn optional_point(
    longitude: Option<f64>,
    latitude: Option<f64>,
) -> AppResult<Option<GeoPoint>> {
    match (longitude, latitude) {
        (Some(lon), Some(lat)) => Ok(Some(GeoPoint::new(lon, lat)?)),
        (None, None) => Ok(None),
        _ => Err(AppError::invalid_input(
            "longitude and latitude must be provided together",
        )),
    }
}

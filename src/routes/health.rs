// ABOUTME: Health check HTTP routes
// ABOUTME: Unauthenticated liveness endpoint with a database ping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::errors::AppError;
use crate::resources::ServerResources;

/// Health check routes
pub struct HealthRoutes;

impl HealthRoutes {
    /// Build health routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::health))
            .with_state(resources)
    }

    /// Handle GET /health
    ///
    /// # Errors
    ///
    /// Returns a database error when the pool cannot serve a trivial query
    async fn health(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        sqlx::query("SELECT 1")
            .execute(&resources.database.pool())
            .await
            .map_err(|e| AppError::database(format!("Health check failed: {e}")))?;

        Ok(Json(serde_json::json!({
            "status": "healthy",
            "service": "agrilink",
            "version": env!("CARGO_PKG_VERSION"),
        }))
        .into_response())
    }
}

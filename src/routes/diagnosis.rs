// ABOUTME: Diagnosis HTTP routes
// ABOUTME: Runs the diagnosis engine, records results, and serves the community feed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::authenticate;
use crate::database::DiagnosisManager;
use crate::errors::AppError;
use crate::models::{Diagnosis, Disease};
use crate::resources::ServerResources;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiagnoseRequest {
    image_path: String,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeedQuery {
    crop: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShareRequest {
    diagnosis_id: Uuid,
}

/// A diagnosis as returned to its owner, with the disease resolved inline
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DiagnoseResponse {
    id: Uuid,
    disease: Option<Disease>,
    confidence: u8,
    notes: Option<String>,
    image_path: String,
    is_shared: bool,
    created_at: String,
}

/// Diagnosis routes
pub struct DiagnosisRoutes;

impl DiagnosisRoutes {
    /// Build diagnosis routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/diagnose", post(Self::diagnose))
            .route("/api/share-diagnosis", post(Self::share_diagnosis))
            .route("/api/community-diagnoses", get(Self::community_feed))
            .with_state(resources)
    }

    /// Handle POST /api/diagnose
    ///
    /// Runs the configured engine against the referenced image and persists
    /// the outcome as a private diagnosis record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty image path
    async fn diagnose(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<DiagnoseRequest>,
    ) -> Result<Response, AppError> {
        let caller = authenticate(&headers, &resources).await?;

        let image_path = request.image_path.trim();
        if image_path.is_empty() {
            return Err(AppError::invalid_input("imagePath is required"));
        }

        let diagnoses = DiagnosisManager::new(resources.database.pool());
        let catalog = diagnoses.list_diseases().await?;

        let outcome = resources
            .diagnosis_engine
            .diagnose(image_path, &catalog)
            .await?;

        let record = Diagnosis {
            id: Uuid::new_v4(),
            user_id: caller.id,
            disease_id: outcome.disease.as_ref().map(|d| d.id),
            image_path: image_path.to_owned(),
            confidence: outcome.confidence,
            notes: request.notes.or(Some(outcome.notes)),
            is_shared: false,
            created_at: Utc::now(),
        };
        diagnoses.create_diagnosis(&record).await?;

        Ok((
            StatusCode::OK,
            Json(DiagnoseResponse {
                id: record.id,
                disease: outcome.disease,
                confidence: record.confidence,
                notes: record.notes,
                image_path: record.image_path,
                is_shared: record.is_shared,
                created_at: record.created_at.to_rfc3339(),
            }),
        )
            .into_response())
    }

    /// Handle POST /api/share-diagnosis
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the diagnosis does not exist or is owned by
    /// someone else; ownership failures are indistinguishable from absence.
    async fn share_diagnosis(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ShareRequest>,
    ) -> Result<Response, AppError> {
        let caller = authenticate(&headers, &resources).await?;

        let diagnoses = DiagnosisManager::new(resources.database.pool());
        diagnoses
            .share_diagnosis(request.diagnosis_id, caller.id)
            .await?;

        Ok(Json(serde_json::json!({ "shared": true })).into_response())
    }

    /// Handle GET /api/community-diagnoses
    ///
    /// Shared diagnoses, newest first and capped at 20. A `crop` query
    /// parameter filters on the disease's affected crops; without one the
    /// caller's own crops are used, and a caller with no crops sees
    /// everything.
    ///
    /// # Errors
    ///
    /// Returns an error when authentication fails
    async fn community_feed(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<FeedQuery>,
    ) -> Result<Response, AppError> {
        let caller = authenticate(&headers, &resources).await?;

        let diagnoses = DiagnosisManager::new(resources.database.pool());
        let feed = diagnoses
            .community_feed(query.crop.as_deref(), &caller.crops)
            .await?;

        Ok(Json(feed).into_response())
    }
}

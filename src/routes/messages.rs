// ABOUTME: Message log HTTP routes
// ABOUTME: Participant-gated history reads and atomic message appends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::authenticate;
use crate::database::MessagingManager;
use crate::errors::AppError;
use crate::resources::ServerResources;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest {
    conversation_id: Uuid,
    content: String,
}

/// Message log routes
pub struct MessageRoutes;

impl MessageRoutes {
    /// Build message routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/messages/:conversation_id", get(Self::list_messages))
            .route("/api/messages", post(Self::send_message))
            .with_state(resources)
    }

    /// Handle GET /api/messages/:conversation_id
    ///
    /// Returns the full history oldest-first; only participants may read it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing conversation and `PermissionDenied`
    /// for non-participants.
    async fn list_messages(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(conversation_id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let caller = authenticate(&headers, &resources).await?;

        let messaging = MessagingManager::new(resources.database.pool());
        let messages = messaging.list_messages(conversation_id, caller.id).await?;

        Ok(Json(messages).into_response())
    }

    /// Handle POST /api/messages
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for whitespace-only content, `NotFound` for a
    /// missing conversation, and `PermissionDenied` for non-participants.
    async fn send_message(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<SendMessageRequest>,
    ) -> Result<Response, AppError> {
        let caller = authenticate(&headers, &resources).await?;

        let messaging = MessagingManager::new(resources.database.pool());
        let message = messaging
            .append_message(request.conversation_id, caller.id, &request.content)
            .await?;

        Ok((StatusCode::CREATED, Json(message)).into_response())
    }
}

// ABOUTME: Conversation registry HTTP routes
// ABOUTME: Get-or-create per recipient and the caller's activity-ordered list
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

use std::sync::Arc;

use axum::{
    extract::State,
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
struct CreateConversationRequest {
    recipient: Uuid,
}

/// Conversation registry routes
pub struct ConversationRoutes;

impl ConversationRoutes {
    /// Build conversation routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/conversations", get(Self::list_conversations))
            .route("/api/conversations", post(Self::get_or_create))
            .with_state(resources)
    }

    /// Handle GET /api/conversations
    ///
    /// Lists the caller's conversations, most recently active first, each
    /// with the other participant resolved and the last message attached.
    ///
    /// # Errors
    ///
    /// Returns an error when authentication fails
    async fn list_conversations(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let caller = authenticate(&headers, &resources).await?;

        let messaging = MessagingManager::new(resources.database.pool());
        let summaries = messaging.list_conversations(caller.id).await?;

        Ok(Json(summaries).into_response())
    }

    /// Handle POST /api/conversations
    ///
    /// Returns 201 when this request created the conversation and 200 when
    /// the pair already had one. The body is the caller-relative summary
    /// either way: the recipient is always the other participant, and the
    /// raw participant pair never leaves the storage layer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a self-conversation and `NotFound` for an
    /// unknown recipient.
    async fn get_or_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CreateConversationRequest>,
    ) -> Result<Response, AppError> {
        let caller = authenticate(&headers, &resources).await?;

        let messaging = MessagingManager::new(resources.database.pool());
        let (conversation, created) = messaging
            .get_or_create_conversation(caller.id, request.recipient)
            .await?;
        let summary = messaging
            .summarize_conversation(&conversation, caller.id)
            .await?;

        let status = if created {
            StatusCode::CREATED
        } else {
            StatusCode::OK
        };

        Ok((status, Json(summary)).into_response())
    }
}

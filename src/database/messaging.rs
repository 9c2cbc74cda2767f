// ABOUTME: Conversation registry and message log database operations
// ABOUTME: Race-safe get-or-create per pair, ordered history, and the last-message cache
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};
use crate::errors::{AppError, AppResult};
use crate::models::{Conversation, ConversationSummary, Message, PublicProfile};

/// Messaging database operations manager
///
/// Owns both the conversation registry and the message log. The registry
/// guarantees at most one conversation per unordered participant pair via the
/// `UNIQUE(participant_low, participant_high)` constraint; the log is
/// append-only and ordered by creation time.
pub struct MessagingManager {
    pool: SqlitePool,
}

impl MessagingManager {
    /// Create a new messaging manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Conversation Registry
    // ========================================================================

    /// Get the existing conversation for a pair, or create one
    ///
    /// Idempotent over the unordered pair: calling with `(a, b)` or `(b, a)`,
    /// sequentially or concurrently, always converges on the same row. The
    /// create path is insert-then-reread — a loser of a concurrent insert
    /// hits the uniqueness constraint, which `ON CONFLICT DO NOTHING`
    /// swallows, and the re-read picks up the winner's row.
    ///
    /// Returns the conversation and whether this call created it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when `a == b`, `NotFound` when the recipient
    /// does not exist, or a database error on query failure.
    pub async fn get_or_create_conversation(
        &self,
        caller: Uuid,
        recipient: Uuid,
    ) -> AppResult<(Conversation, bool)> {
        if caller == recipient {
            return Err(AppError::invalid_input(
                "Cannot start a conversation with yourself",
            ));
        }

        let recipient_row = sqlx::query("SELECT 1 FROM users WHERE id = $1")
            .bind(recipient.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to check recipient: {e}")))?;
        if recipient_row.is_none() {
            return Err(AppError::not_found("Recipient"));
        }

        let (low, high) = Conversation::normalize_pair(caller, recipient);

        if let Some(existing) = self.find_by_pair(low, high).await? {
            return Ok((existing, false));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        let result = sqlx::query(
            r"
            INSERT INTO conversations (id, participant_low, participant_high, last_message_id, created_at, updated_at)
            VALUES ($1, $2, $3, NULL, $4, $4)
            ON CONFLICT(participant_low, participant_high) DO NOTHING
            ",
        )
        .bind(id.to_string())
        .bind(low.to_string())
        .bind(high.to_string())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create conversation: {e}")))?;

        let created = result.rows_affected() > 0;

        // Single retry via re-lookup covers the lost-race case; the row must
        // exist by now either way.
        self.find_by_pair(low, high)
            .await?
            .map(|conversation| (conversation, created))
            .ok_or_else(|| AppError::database("Conversation missing after insert"))
    }

    /// Get a conversation by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_conversation(&self, id: Uuid) -> AppResult<Option<Conversation>> {
        let row = sqlx::query(
            r"
            SELECT id, participant_low, participant_high, last_message_id, created_at, updated_at
            FROM conversations
            WHERE id = $1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get conversation: {e}")))?;

        row.map(|r| Self::row_to_conversation(&r)).transpose()
    }

    /// List the caller's conversations, most recently active first
    ///
    /// Each summary resolves the other participant relative to the caller and
    /// carries the last message, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_conversations(&self, caller: Uuid) -> AppResult<Vec<ConversationSummary>> {
        let rows = sqlx::query(
            r"
            SELECT c.id, c.participant_low, c.participant_high, c.last_message_id,
                   c.created_at, c.updated_at,
                   u.id AS other_id, u.name AS other_name,
                   m.id AS msg_id, m.conversation_id AS msg_conversation_id,
                   m.sender_id AS msg_sender_id, m.content AS msg_content,
                   m.created_at AS msg_created_at
            FROM conversations c
            JOIN users u ON u.id = CASE
                WHEN c.participant_low = $1 THEN c.participant_high
                ELSE c.participant_low
            END
            LEFT JOIN messages m ON m.id = c.last_message_id
            WHERE c.participant_low = $1 OR c.participant_high = $1
            ORDER BY c.updated_at DESC
            ",
        )
        .bind(caller.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list conversations: {e}")))?;

        rows.iter()
            .map(|row| {
                let conversation = Self::row_to_conversation(row)?;
                let other_id_str: String = row.get("other_id");
                let last_message = Self::row_to_optional_message(row)?;

                Ok(ConversationSummary {
                    id: conversation.id,
                    recipient: PublicProfile {
                        id: parse_uuid(&other_id_str)?,
                        name: row.get("other_name"),
                    },
                    last_message,
                    created_at: conversation.created_at,
                    updated_at: conversation.updated_at,
                })
            })
            .collect()
    }

    /// Build the caller-relative view of a single conversation
    ///
    /// Resolves the *other* participant's public identity and the last
    /// message; the caller is never shown as the recipient. This is the
    /// single-row counterpart of [`Self::list_conversations`].
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` when `caller` is not a participant, or a
    /// database error when a referenced row is missing.
    pub async fn summarize_conversation(
        &self,
        conversation: &Conversation,
        caller: Uuid,
    ) -> AppResult<ConversationSummary> {
        let other = conversation
            .other_participant(caller)
            .ok_or_else(|| AppError::forbidden("Not a participant of this conversation"))?;

        let row = sqlx::query("SELECT name FROM users WHERE id = $1")
            .bind(other.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to resolve recipient: {e}")))?
            .ok_or_else(|| AppError::database("Conversation references a missing user"))?;

        let last_message = match conversation.last_message_id {
            Some(id) => self.get_message(id).await?,
            None => None,
        };

        Ok(ConversationSummary {
            id: conversation.id,
            recipient: PublicProfile {
                id: other,
                name: row.get("name"),
            },
            last_message,
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
        })
    }

    // ========================================================================
    // Message Log
    // ========================================================================

    /// Append a message to a conversation
    ///
    /// The message insert and the parent conversation's cache refresh
    /// (`last_message_id`, `updated_at`) commit as one transaction; the log
    /// is the source of truth and the pointer is never left pointing at a
    /// message that was not persisted.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing conversation, `PermissionDenied` when
    /// the sender is not a participant, or `InvalidInput` for whitespace-only
    /// content.
    pub async fn append_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> AppResult<Message> {
        if content.trim().is_empty() {
            return Err(AppError::invalid_input("Message content cannot be empty"));
        }

        let conversation = self
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| AppError::not_found("Conversation"))?;

        if !conversation.involves(sender_id) {
            return Err(AppError::forbidden(
                "Only participants can send messages to this conversation",
            ));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO messages (id, conversation_id, sender_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(id.to_string())
        .bind(conversation_id.to_string())
        .bind(sender_id.to_string())
        .bind(content)
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to append message: {e}")))?;

        sqlx::query(
            r"
            UPDATE conversations
            SET last_message_id = $1, updated_at = $2
            WHERE id = $3
            ",
        )
        .bind(id.to_string())
        .bind(now.to_rfc3339())
        .bind(conversation_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to update conversation: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit message: {e}")))?;

        Ok(Message {
            id,
            conversation_id,
            sender_id,
            content: content.to_owned(),
            created_at: now,
        })
    }

    /// List a conversation's messages, oldest first
    ///
    /// The ascending order is deliberate and the reverse of the conversation
    /// list: history reads top-down.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing conversation or `PermissionDenied`
    /// when the requester is not a participant.
    pub async fn list_messages(
        &self,
        conversation_id: Uuid,
        requester_id: Uuid,
    ) -> AppResult<Vec<Message>> {
        let conversation = self
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| AppError::not_found("Conversation"))?;

        if !conversation.involves(requester_id) {
            return Err(AppError::forbidden(
                "Only participants can read this conversation",
            ));
        }

        let rows = sqlx::query(
            r"
            SELECT id, conversation_id, sender_id, content, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(conversation_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list messages: {e}")))?;

        rows.iter().map(Self::row_to_message).collect()
    }

    async fn get_message(&self, id: Uuid) -> AppResult<Option<Message>> {
        let row = sqlx::query(
            r"
            SELECT id, conversation_id, sender_id, content, created_at
            FROM messages
            WHERE id = $1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get message: {e}")))?;

        row.as_ref().map(Self::row_to_message).transpose()
    }

    async fn find_by_pair(&self, low: Uuid, high: Uuid) -> AppResult<Option<Conversation>> {
        let row = sqlx::query(
            r"
            SELECT id, participant_low, participant_high, last_message_id, created_at, updated_at
            FROM conversations
            WHERE participant_low = $1 AND participant_high = $2
            ",
        )
        .bind(low.to_string())
        .bind(high.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to look up conversation: {e}")))?;

        row.map(|r| Self::row_to_conversation(&r)).transpose()
    }

    fn row_to_conversation(row: &SqliteRow) -> AppResult<Conversation> {
        let id_str: String = row.get("id");
        let low_str: String = row.get("participant_low");
        let high_str: String = row.get("participant_high");
        let last_message_str: Option<String> = row.get("last_message_id");
        let created_at_str: String = row.get("created_at");
        let updated_at_str: String = row.get("updated_at");

        Ok(Conversation {
            id: parse_uuid(&id_str)?,
            participant_low: parse_uuid(&low_str)?,
            participant_high: parse_uuid(&high_str)?,
            last_message_id: last_message_str.as_deref().map(parse_uuid).transpose()?,
            created_at: parse_timestamp(&created_at_str)?,
            updated_at: parse_timestamp(&updated_at_str)?,
        })
    }

    fn row_to_message(row: &SqliteRow) -> AppResult<Message> {
        let id_str: String = row.get("id");
        let conversation_str: String = row.get("conversation_id");
        let sender_str: String = row.get("sender_id");
        let created_at_str: String = row.get("created_at");

        Ok(Message {
            id: parse_uuid(&id_str)?,
            conversation_id: parse_uuid(&conversation_str)?,
            sender_id: parse_uuid(&sender_str)?,
            content: row.get("content"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    fn row_to_optional_message(row: &SqliteRow) -> AppResult<Option<Message>> {
        let msg_id: Option<String> = row.get("msg_id");
        let Some(id_str) = msg_id else {
            return Ok(None);
        };

        let conversation_str: String = row.get("msg_conversation_id");
        let sender_str: String = row.get("msg_sender_id");
        let created_at_str: String = row.get("msg_created_at");

        Ok(Some(Message {
            id: parse_uuid(&id_str)?,
            conversation_id: parse_uuid(&conversation_str)?,
            sender_id: parse_uuid(&sender_str)?,
            content: row.get("msg_content"),
            created_at: parse_timestamp(&created_at_str)?,
        }))
    }
}

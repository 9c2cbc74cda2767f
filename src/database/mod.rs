// ABOUTME: Database management for the AgriLink server
// ABOUTME: Connection setup, schema migrations, and manager submodules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

//! # Database Management
//!
//! SQLite-backed storage for users, conversations, messages, diseases, and
//! diagnoses. The schema is created in code at startup; managers in the
//! submodules wrap the pool and own all SQL for their domain.

/// Disease catalog and diagnosis record operations
pub mod diagnoses;
/// Conversation registry and message log operations
pub mod messaging;
/// User identity store and proximity search
pub mod users;

pub use diagnoses::DiagnosisManager;
pub use messaging::MessagingManager;
pub use users::IdentityManager;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::errors::{AppError, AppResult};

/// Database manager owning the connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails.
    pub async fn new(database_url: &str) -> AppResult<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:")
            && !database_url.contains("memory")
            && !database_url.contains('?')
        {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a clone of the pool for manager construction
    #[must_use]
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any DDL statement fails.
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_messaging().await?;
        self.migrate_diagnoses().await?;
        Ok(())
    }

    async fn migrate_users(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                longitude REAL,
                latitude REAL,
                crops TEXT NOT NULL DEFAULT '[]',
                expertise TEXT,
                equipment TEXT NOT NULL DEFAULT '[]',
                experience INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create users table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to create email index: {e}")))?;

        // Spatial prefilter index: bounding-box queries resolve against this
        // before the exact distance check
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_location ON users(latitude, longitude)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to create location index: {e}")))?;

        Ok(())
    }

    async fn migrate_messaging(&self) -> AppResult<()> {
        // The unique constraint over the normalized pair is what makes
        // get-or-create race-safe: the loser of a concurrent insert hits the
        // conflict and recovers by re-reading the winner's row.
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                participant_low TEXT NOT NULL REFERENCES users(id),
                participant_high TEXT NOT NULL REFERENCES users(id),
                last_message_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(participant_low, participant_high)
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create conversations table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
                sender_id TEXT NOT NULL REFERENCES users(id),
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create messages table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create messages index: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_conversations_updated ON conversations(updated_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create conversations index: {e}")))?;

        Ok(())
    }

    async fn migrate_diagnoses(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS diseases (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                symptoms TEXT NOT NULL DEFAULT '[]',
                treatment TEXT,
                affected_crops TEXT NOT NULL DEFAULT '[]'
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create diseases table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS diagnoses (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id),
                disease_id TEXT REFERENCES diseases(id),
                image_path TEXT NOT NULL,
                confidence INTEGER NOT NULL,
                notes TEXT,
                is_shared INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create diagnoses table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_diagnoses_shared ON diagnoses(is_shared, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create diagnoses index: {e}")))?;

        Ok(())
    }
}

/// Parse an RFC 3339 timestamp stored as text
///
/// # Errors
///
/// Returns a database error when the stored value is not valid RFC 3339.
pub(crate) fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Invalid stored timestamp '{value}': {e}")))
}

/// Parse a UUID stored as text
///
/// # Errors
///
/// Returns a database error when the stored value is not a valid UUID.
pub(crate) fn parse_uuid(value: &str) -> AppResult<uuid::Uuid> {
    uuid::Uuid::parse_str(value)
        .map_err(|e| AppError::database(format!("Invalid stored UUID '{value}': {e}")))
}

/// Parse a JSON-encoded string array column
///
/// # Errors
///
/// Returns a database error when the stored value is not a JSON string array.
pub(crate) fn parse_tags(value: &str) -> AppResult<Vec<String>> {
    serde_json::from_str(value)
        .map_err(|e| AppError::database(format!("Invalid stored tag list: {e}")))
}

/// Encode a string array for JSON text storage
pub(crate) fn encode_tags(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_owned())
}

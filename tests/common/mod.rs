// ABOUTME: Shared helpers for AgriLink integration tests
// ABOUTME: File-backed temporary databases and user fixtures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code, missing_docs)]

use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

use agrilink::database::{Database, IdentityManager};
use agrilink::geo::GeoPoint;
use agrilink::models::User;

/// Open a migrated database backed by a temporary file
///
/// A file-backed database gives every pooled connection the same data,
/// which the concurrency tests rely on. The `TempDir` must outlive the
/// database.
pub async fn setup_database() -> (Database, TempDir) {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite:{}", dir.path().join("test.db").display());
    let database = Database::new(&url).await.unwrap();
    (database, dir)
}

/// Insert a user with a location and return it
pub async fn create_located_user(
    database: &Database,
    name: &str,
    longitude: f64,
    latitude: f64,
) -> User {
    let user = User {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        password_hash: "hash".to_owned(),
        location: Some(GeoPoint::new(longitude, latitude).unwrap()),
        crops: vec![],
        expertise: None,
        equipment: vec![],
        experience: 0,
        created_at: Utc::now(),
    };
    IdentityManager::new(database.pool())
        .create_user(&user)
        .await
        .unwrap();
    user
}

/// Insert a user without a location and return it
pub async fn create_user(database: &Database, name: &str) -> User {
    let user = User {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        password_hash: "hash".to_owned(),
        location: None,
        crops: vec![],
        expertise: None,
        equipment: vec![],
        experience: 0,
        created_at: Utc::now(),
    };
    IdentityManager::new(database.pool())
        .create_user(&user)
        .await
        .unwrap();
    user
}

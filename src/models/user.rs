// ABOUTME: User identity model with location and farming profile attributes
// ABOUTME: User, public projection, nearby-search result, and profile update types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;

/// A registered farmer account
///
/// The credential hash never leaves the storage/auth boundary; HTTP
/// projections are built from [`PublicProfile`] or the route layer's own
/// response types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Unique login handle
    pub email: String,
    /// Bcrypt credential hash
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Geographic location, longitude first
    pub location: Option<GeoPoint>,
    /// Crop tags grown by this farmer
    pub crops: Vec<String>,
    /// Optional expertise category
    pub expertise: Option<String>,
    /// Equipment tags owned by this farmer
    pub equipment: Vec<String>,
    /// Years of experience
    pub experience: u32,
    /// Account creation time
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Public projection shown to other users
    #[must_use]
    pub fn public_profile(&self) -> PublicProfile {
        PublicProfile {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Minimal identity projection safe to show to other users
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicProfile {
    /// User ID
    pub id: Uuid,
    /// Display name
    pub name: String,
}

/// A proximity search result: an identity with its distance from the origin
#[derive(Debug, Clone)]
pub struct NearbyFarmer {
    /// The matched identity
    pub user: User,
    /// Great-circle distance from the search origin, in meters
    pub distance_meters: f64,
}

/// Fields an owner may change on their own profile
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub location: Option<GeoPoint>,
    pub crops: Option<Vec<String>>,
    pub expertise: Option<Option<String>>,
    pub equipment: Option<Vec<String>>,
    pub experience: Option<u32>,
}

// ABOUTME: User identity store operations and geo-proximity farmer search
// ABOUTME: CRUD for user records plus the bounding-box + haversine nearby query
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{encode_tags, parse_tags, parse_timestamp, parse_uuid};
use crate::errors::{AppError, AppResult};
use crate::geo::{BoundingBox, GeoPoint};
use crate::models::{NearbyFarmer, ProfileUpdate, User};

/// Default search radius when the query does not specify one: 50 km
pub const DEFAULT_SEARCH_RADIUS_METERS: f64 = 50_000.0;

/// Optional attribute filters for the proximity search
///
/// Each present filter is a conjunctive predicate; any subset may be applied.
#[derive(Debug, Clone, Default)]
pub struct NearbyFilters {
    /// Crop tag the farmer must grow
    pub crop: Option<String>,
    /// Exact expertise category match
    pub expertise: Option<String>,
    /// Equipment tag the farmer must own
    pub equipment: Option<String>,
}

/// User identity store operations manager
pub struct IdentityManager {
    pool: SqlitePool,
}

impl IdentityManager {
    /// Create a new identity manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a user record
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the email is already registered, or a
    /// database error on other failures.
    pub async fn create_user(&self, user: &User) -> AppResult<Uuid> {
        let result = sqlx::query(
            r"
            INSERT INTO users (id, name, email, password_hash, longitude, latitude, crops, expertise, equipment, experience, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.location.map(|p| p.longitude))
        .bind(user.location.map(|p| p.latitude))
        .bind(encode_tags(&user.crops))
        .bind(&user.expertise)
        .bind(encode_tags(&user.equipment))
        .bind(i64::from(user.experience))
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user.id),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                AppError::invalid_input("This email address is already registered"),
            ),
            Err(e) => Err(AppError::database(format!("Failed to create user: {e}"))),
        }
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, name, email, password_hash, longitude, latitude, crops, expertise, equipment, experience, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        row.map(|r| Self::row_to_user(&r)).transpose()
    }

    /// Get a user by login handle
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, name, email, password_hash, longitude, latitude, crops, expertise, equipment, experience, created_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user by email: {e}")))?;

        row.map(|r| Self::row_to_user(&r)).transpose()
    }

    /// Whether a user with the given ID exists
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn user_exists(&self, id: Uuid) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM users WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to check user existence: {e}")))?;

        Ok(row.is_some())
    }

    /// Apply a profile update on behalf of the owning user
    ///
    /// Only fields present in the update are changed. Returns the updated
    /// record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the user does not exist.
    pub async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> AppResult<User> {
        let current = self
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let name = update.name.clone().unwrap_or(current.name);
        let location = update.location.or(current.location);
        let crops = update.crops.clone().unwrap_or(current.crops);
        let expertise = update.expertise.clone().unwrap_or(current.expertise);
        let equipment = update.equipment.clone().unwrap_or(current.equipment);
        let experience = update.experience.unwrap_or(current.experience);

        sqlx::query(
            r"
            UPDATE users
            SET name = $1, longitude = $2, latitude = $3, crops = $4, expertise = $5, equipment = $6, experience = $7
            WHERE id = $8
            ",
        )
        .bind(&name)
        .bind(location.map(|p| p.longitude))
        .bind(location.map(|p| p.latitude))
        .bind(encode_tags(&crops))
        .bind(&expertise)
        .bind(encode_tags(&equipment))
        .bind(i64::from(experience))
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update profile: {e}")))?;

        Ok(User {
            name,
            location,
            crops,
            expertise,
            equipment,
            experience,
            ..current
        })
    }

    /// Find farmers near an origin point, ordered by ascending distance
    ///
    /// Candidate selection uses a radius-derived bounding box against the
    /// `(latitude, longitude)` index, so the exact haversine check only runs
    /// on a small window of rows. The requesting identity is always excluded.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the radius is negative, or a database
    /// error on query failure.
    pub async fn find_nearby(
        &self,
        origin: &GeoPoint,
        max_distance_meters: f64,
        filters: &NearbyFilters,
        exclude_id: Uuid,
    ) -> AppResult<Vec<NearbyFarmer>> {
        if !max_distance_meters.is_finite() || max_distance_meters < 0.0 {
            return Err(AppError::invalid_input(
                "maxDistance must be a non-negative number",
            ));
        }

        let bbox = BoundingBox::around(origin, max_distance_meters);

        let rows = sqlx::query(
            r"
            SELECT id, name, email, password_hash, longitude, latitude, crops, expertise, equipment, experience, created_at
            FROM users
            WHERE id != $1
              AND latitude IS NOT NULL AND longitude IS NOT NULL
              AND latitude BETWEEN $2 AND $3
              AND longitude BETWEEN $4 AND $5
            ",
        )
        .bind(exclude_id.to_string())
        .bind(bbox.min_latitude)
        .bind(bbox.max_latitude)
        .bind(bbox.min_longitude)
        .bind(bbox.max_longitude)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to search nearby farmers: {e}")))?;

        let mut results = Vec::new();
        for row in &rows {
            let user = Self::row_to_user(row)?;
            let Some(location) = user.location else {
                continue;
            };

            if !Self::matches_filters(&user, filters) {
                continue;
            }

            let distance = origin.distance_meters(&location);
            if distance <= max_distance_meters {
                results.push(NearbyFarmer {
                    user,
                    distance_meters: distance,
                });
            }
        }

        results.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
        Ok(results)
    }

    fn matches_filters(user: &User, filters: &NearbyFilters) -> bool {
        if let Some(crop) = &filters.crop {
            if !user.crops.iter().any(|c| c == crop) {
                return false;
            }
        }
        if let Some(expertise) = &filters.expertise {
            if user.expertise.as_deref() != Some(expertise.as_str()) {
                return false;
            }
        }
        if let Some(equipment) = &filters.equipment {
            if !user.equipment.iter().any(|e| e == equipment) {
                return false;
            }
        }
        true
    }

    fn row_to_user(row: &SqliteRow) -> AppResult<User> {
        let id_str: String = row.get("id");
        let crops_str: String = row.get("crops");
        let equipment_str: String = row.get("equipment");
        let created_at_str: String = row.get("created_at");
        let longitude: Option<f64> = row.get("longitude");
        let latitude: Option<f64> = row.get("latitude");
        let experience: i64 = row.get("experience");

        let location = match (longitude, latitude) {
            (Some(lon), Some(lat)) => Some(GeoPoint::new(lon, lat)?),
            _ => None,
        };

        Ok(User {
            id: parse_uuid(&id_str)?,
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            location,
            crops: parse_tags(&crops_str)?,
            expertise: row.get("expertise"),
            equipment: parse_tags(&equipment_str)?,
            experience: u32::try_from(experience.max(0)).unwrap_or(0),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }
}

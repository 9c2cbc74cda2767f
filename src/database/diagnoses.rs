// ABOUTME: Disease catalog and diagnosis record database operations
// ABOUTME: Seeding, diagnosis CRUD, sharing, and the crop-filtered community feed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{encode_tags, parse_tags, parse_timestamp, parse_uuid};
use crate::errors::{AppError, AppResult};
use crate::models::{Diagnosis, Disease, PublicProfile};

/// Maximum entries returned by the community feed
const FEED_LIMIT: usize = 20;

/// A community feed entry: a shared diagnosis with its author and disease
#[derive(Debug, Clone, serde::Serialize)]
pub struct FeedItem {
    /// The shared diagnosis
    pub diagnosis: Diagnosis,
    /// Who shared it
    pub user: PublicProfile,
    /// The matched disease, if any
    pub disease: Option<Disease>,
}

/// Diagnosis database operations manager
pub struct DiagnosisManager {
    pool: SqlitePool,
}

impl DiagnosisManager {
    /// Create a new diagnosis manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Seed the disease catalog when it is empty
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn seed_diseases(&self) -> AppResult<()> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM diseases")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count diseases: {e}")))?;
        let count: i64 = row.get("count");

        if count > 0 {
            return Ok(());
        }

        for disease in reference_diseases() {
            sqlx::query(
                r"
                INSERT INTO diseases (id, name, description, symptoms, treatment, affected_crops)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(disease.id.to_string())
            .bind(&disease.name)
            .bind(&disease.description)
            .bind(encode_tags(&disease.symptoms))
            .bind(&disease.treatment)
            .bind(encode_tags(&disease.affected_crops))
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to seed diseases: {e}")))?;
        }

        tracing::info!("Seeded disease reference catalog");
        Ok(())
    }

    /// List the disease catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_diseases(&self) -> AppResult<Vec<Disease>> {
        let rows = sqlx::query(
            "SELECT id, name, description, symptoms, treatment, affected_crops FROM diseases",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list diseases: {e}")))?;

        rows.iter().map(Self::row_to_disease).collect()
    }

    /// Persist a diagnosis record
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn create_diagnosis(&self, diagnosis: &Diagnosis) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO diagnoses (id, user_id, disease_id, image_path, confidence, notes, is_shared, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(diagnosis.id.to_string())
        .bind(diagnosis.user_id.to_string())
        .bind(diagnosis.disease_id.map(|d| d.to_string()))
        .bind(&diagnosis.image_path)
        .bind(i64::from(diagnosis.confidence))
        .bind(&diagnosis.notes)
        .bind(diagnosis.is_shared)
        .bind(diagnosis.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create diagnosis: {e}")))?;

        Ok(diagnosis.id)
    }

    /// Mark one of the caller's diagnoses as shared with the community
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the diagnosis does not exist or belongs to
    /// another user.
    pub async fn share_diagnosis(&self, diagnosis_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            r"
            UPDATE diagnoses
            SET is_shared = 1
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(diagnosis_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to share diagnosis: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Diagnosis"));
        }
        Ok(())
    }

    /// Read the community feed of shared diagnoses, newest first
    ///
    /// When `crop` is given it filters on the disease's affected crops;
    /// otherwise any of the caller's own crops match. With neither, all
    /// shared diagnoses are returned. Capped at 20 entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn community_feed(
        &self,
        crop: Option<&str>,
        caller_crops: &[String],
    ) -> AppResult<Vec<FeedItem>> {
        let rows = sqlx::query(
            r"
            SELECT dg.id, dg.user_id, dg.disease_id, dg.image_path, dg.confidence,
                   dg.notes, dg.is_shared, dg.created_at,
                   u.name AS user_name,
                   ds.id AS ds_id, ds.name AS ds_name, ds.description AS ds_description,
                   ds.symptoms AS ds_symptoms, ds.treatment AS ds_treatment,
                   ds.affected_crops AS ds_affected_crops
            FROM diagnoses dg
            JOIN users u ON u.id = dg.user_id
            LEFT JOIN diseases ds ON ds.id = dg.disease_id
            WHERE dg.is_shared = 1
            ORDER BY dg.created_at DESC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to read community feed: {e}")))?;

        let mut feed = Vec::new();
        for row in &rows {
            let item = Self::row_to_feed_item(row)?;

            let crop_match = match (crop, &item.disease) {
                (Some(wanted), Some(disease)) => {
                    disease.affected_crops.iter().any(|c| c == wanted)
                }
                (Some(_), None) => false,
                (None, Some(disease)) if !caller_crops.is_empty() => disease
                    .affected_crops
                    .iter()
                    .any(|c| caller_crops.contains(c)),
                (None, _) => true,
            };

            if crop_match {
                feed.push(item);
            }
            if feed.len() >= FEED_LIMIT {
                break;
            }
        }

        Ok(feed)
    }

    fn row_to_disease(row: &SqliteRow) -> AppResult<Disease> {
        let id_str: String = row.get("id");
        let symptoms_str: String = row.get("symptoms");
        let crops_str: String = row.get("affected_crops");

        Ok(Disease {
            id: parse_uuid(&id_str)?,
            name: row.get("name"),
            description: row.get("description"),
            symptoms: parse_tags(&symptoms_str)?,
            treatment: row.get("treatment"),
            affected_crops: parse_tags(&crops_str)?,
        })
    }

    fn row_to_feed_item(row: &SqliteRow) -> AppResult<FeedItem> {
        let id_str: String = row.get("id");
        let user_id_str: String = row.get("user_id");
        let disease_id_str: Option<String> = row.get("disease_id");
        let confidence: i64 = row.get("confidence");
        let created_at_str: String = row.get("created_at");

        let disease = match disease_id_str {
            Some(_) => {
                let ds_id: String = row.get("ds_id");
                let ds_symptoms: String = row.get("ds_symptoms");
                let ds_crops: String = row.get("ds_affected_crops");
                Some(Disease {
                    id: parse_uuid(&ds_id)?,
                    name: row.get("ds_name"),
                    description: row.get("ds_description"),
                    symptoms: parse_tags(&ds_symptoms)?,
                    treatment: row.get("ds_treatment"),
                    affected_crops: parse_tags(&ds_crops)?,
                })
            }
            None => None,
        };

        let user_id = parse_uuid(&user_id_str)?;

        Ok(FeedItem {
            diagnosis: Diagnosis {
                id: parse_uuid(&id_str)?,
                user_id,
                disease_id: disease.as_ref().map(|d| d.id),
                image_path: row.get("image_path"),
                confidence: u8::try_from(confidence.clamp(0, 100)).unwrap_or(0),
                notes: row.get("notes"),
                is_shared: row.get("is_shared"),
                created_at: parse_timestamp(&created_at_str)?,
            },
            user: PublicProfile {
                id: user_id,
                name: row.get("user_name"),
            },
            disease,
        })
    }
}

/// Reference catalog seeded on first startup
fn reference_diseases() -> Vec<Disease> {
    vec![
        Disease {
            id: Uuid::new_v4(),
            name: "Tomato late blight".to_owned(),
            description: "A fungal disease attacking leaves, stems, and fruit of tomato plants."
                .to_owned(),
            symptoms: vec![
                "Brown patches on leaves".to_owned(),
                "Fruit rot".to_owned(),
                "Stem lesions".to_owned(),
            ],
            treatment: Some(
                "Apply a copper-based fungicide and improve air circulation around plants."
                    .to_owned(),
            ),
            affected_crops: vec!["tomatoes".to_owned(), "potatoes".to_owned()],
        },
        Disease {
            id: Uuid::new_v4(),
            name: "Powdery mildew".to_owned(),
            description: "A fungal disease showing as a white powdery coating on leaves and stems."
                .to_owned(),
            symptoms: vec![
                "White powder on leaves".to_owned(),
                "Yellowing leaves".to_owned(),
                "Distorted new shoots".to_owned(),
            ],
            treatment: Some(
                "Apply sulfur or a targeted fungicide; avoid overhead watering.".to_owned(),
            ),
            affected_crops: vec!["cereals".to_owned(), "vines".to_owned(), "vegetables".to_owned()],
        },
        Disease {
            id: Uuid::new_v4(),
            name: "Wheat rust".to_owned(),
            description: "A fungal disease forming rust-colored pustules on leaves and stems."
                .to_owned(),
            symptoms: vec![
                "Orange-brown pustules".to_owned(),
                "Drying leaves".to_owned(),
                "Reduced yield".to_owned(),
            ],
            treatment: Some(
                "Plant resistant varieties and apply preventive fungicides.".to_owned(),
            ),
            affected_crops: vec!["wheat".to_owned(), "cereals".to_owned()],
        },
        Disease {
            id: Uuid::new_v4(),
            name: "Apple scab".to_owned(),
            description: "A fungal disease mainly affecting apple and pear trees.".to_owned(),
            symptoms: vec![
                "Olive-black spots on leaves".to_owned(),
                "Fruit lesions".to_owned(),
                "Cracked fruit skin".to_owned(),
            ],
            treatment: Some(
                "Apply preventive fungicides in spring and clear fallen leaves in autumn."
                    .to_owned(),
            ),
            affected_crops: vec!["apples".to_owned(), "pears".to_owned()],
        },
        Disease {
            id: Uuid::new_v4(),
            name: "Grape downy mildew".to_owned(),
            description: "A fungal disease that can rapidly destroy vine leaves and grape clusters."
                .to_owned(),
            symptoms: vec![
                "Oily yellow spots".to_owned(),
                "White down under leaves".to_owned(),
                "Browning clusters".to_owned(),
            ],
            treatment: Some(
                "Apply copper or sulfur fungicides and prune for better airflow.".to_owned(),
            ),
            affected_crops: vec!["vines".to_owned()],
        },
    ]
}

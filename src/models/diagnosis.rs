// ABOUTME: Disease reference data and diagnosis record models
// ABOUTME: Diseases are seeded reference rows; diagnoses link users, diseases, and image paths
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A known plant disease from the reference catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disease {
    /// Unique identifier
    pub id: Uuid,
    /// Disease name
    pub name: String,
    /// Description of the disease
    pub description: String,
    /// Observable symptoms
    pub symptoms: Vec<String>,
    /// Recommended treatment
    pub treatment: Option<String>,
    /// Crop tags this disease affects
    pub affected_crops: Vec<String>,
}

/// A diagnosis produced for an uploaded plant image
///
/// The image is referenced by path/URL only; the server never reads the file
/// bytes. `disease_id` is absent when the engine could not match a catalog
/// entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    /// Unique identifier
    pub id: Uuid,
    /// Diagnosed user
    pub user_id: Uuid,
    /// Matched disease, if any
    pub disease_id: Option<Uuid>,
    /// Path or URL of the analyzed image
    pub image_path: String,
    /// Confidence percentage (0-100)
    pub confidence: u8,
    /// Free-form notes
    pub notes: Option<String>,
    /// Whether the diagnosis is visible in the community feed
    pub is_shared: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Result produced by a [`crate::diagnosis::DiagnosisEngine`]
#[derive(Debug, Clone)]
pub struct DiagnosisOutcome {
    /// Matched disease, if the engine recognized one
    pub disease: Option<Disease>,
    /// Confidence percentage (0-100)
    pub confidence: u8,
    /// Engine-provided notes
    pub notes: String,
}

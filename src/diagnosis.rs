// ABOUTME: Plant disease diagnosis capability interface
// ABOUTME: DiagnosisEngine trait plus the shipped random mock implementation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

//! # Diagnosis Engine
//!
//! The diagnosis step is isolated behind a capability trait so a real image
//! classifier can replace the shipped mock without touching routes or
//! storage. The mock picks a catalog disease uniformly at random with a
//! 70-99% confidence, which is what the product demo ships with.

use async_trait::async_trait;
use rand::Rng;

use crate::errors::AppResult;
use crate::models::{DiagnosisOutcome, Disease};

/// Capability interface for turning an image reference into a diagnosis
///
/// Implementations receive the image by path/URL only and are not expected
/// to read file bytes unless they are a real classifier.
#[async_trait]
pub trait DiagnosisEngine: Send + Sync {
    /// Produce a diagnosis for the referenced image
    ///
    /// # Errors
    ///
    /// Returns an error when the engine cannot produce an outcome
    async fn diagnose(
        &self,
        image_path: &str,
        diseases: &[Disease],
    ) -> AppResult<DiagnosisOutcome>;
}

/// Mock engine: uniform random catalog pick with simulated confidence
#[derive(Debug, Default)]
pub struct RandomDiagnosisEngine;

#[async_trait]
impl DiagnosisEngine for RandomDiagnosisEngine {
    async fn diagnose(
        &self,
        _image_path: &str,
        diseases: &[Disease],
    ) -> AppResult<DiagnosisOutcome> {
        let mut rng = rand::thread_rng();
        let confidence: u8 = rng.gen_range(70..100);

        let disease = if diseases.is_empty() {
            None
        } else {
            Some(diseases[rng.gen_range(0..diseases.len())].clone())
        };

        Ok(DiagnosisOutcome {
            disease,
            confidence,
            notes: "Automated diagnosis".to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn catalog() -> Vec<Disease> {
        vec![Disease {
            id: Uuid::new_v4(),
            name: "Wheat rust".to_owned(),
            description: "Rust-colored pustules".to_owned(),
            symptoms: vec![],
            treatment: None,
            affected_crops: vec!["wheat".to_owned()],
        }]
    }

    #[tokio::test]
    async fn test_confidence_stays_in_mock_range() {
        let engine = RandomDiagnosisEngine;
        for _ in 0..50 {
            let outcome = engine.diagnose("uploads/leaf.jpg", &catalog()).await.unwrap();
            assert!((70..100).contains(&outcome.confidence));
            assert!(outcome.disease.is_some());
        }
    }

    #[tokio::test]
    async fn test_empty_catalog_yields_no_disease() {
        let engine = RandomDiagnosisEngine;
        let outcome = engine.diagnose("uploads/leaf.jpg", &[]).await.unwrap();
        assert!(outcome.disease.is_none());
    }
}

// ABOUTME: Integration tests for the geo-proximity farmer search
// ABOUTME: Covers radius correctness, attribute filters, ordering, and exclusions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use agrilink::database::users::{NearbyFilters, DEFAULT_SEARCH_RADIUS_METERS};
use agrilink::database::IdentityManager;
use agrilink::errors::ErrorCode;
use agrilink::geo::GeoPoint;
use agrilink::models::ProfileUpdate;

use common::{create_located_user, create_user, setup_database};

// Paris city center
const PARIS: (f64, f64) = (2.3522, 48.8566);

#[tokio::test]
async fn test_radius_is_both_correct_and_complete() {
    let (database, _dir) = setup_database().await;
    let caller = create_located_user(&database, "Caller", PARIS.0, PARIS.1).await;

    // Same point, ~8 km away (Boulogne), and ~340 km away (London)
    create_located_user(&database, "At Origin", PARIS.0, PARIS.1).await;
    create_located_user(&database, "Boulogne", 2.2399, 48.8397).await;
    create_located_user(&database, "London", -0.1276, 51.5072).await;

    let identities = IdentityManager::new(database.pool());
    let origin = GeoPoint::new(PARIS.0, PARIS.1).unwrap();

    let results = identities
        .find_nearby(
            &origin,
            DEFAULT_SEARCH_RADIUS_METERS,
            &NearbyFilters::default(),
            caller.id,
        )
        .await
        .unwrap();

    let names: Vec<&str> = results.iter().map(|r| r.user.name.as_str()).collect();
    assert_eq!(names, vec!["At Origin", "Boulogne"]);

    // A 400 km radius reaches London too
    let wide = identities
        .find_nearby(&origin, 400_000.0, &NearbyFilters::default(), caller.id)
        .await
        .unwrap();
    assert_eq!(wide.len(), 3);
    assert_eq!(wide[2].user.name, "London");
    assert!((wide[2].distance_meters - 343_000.0).abs() < 10_000.0);
}

#[tokio::test]
async fn test_results_are_ordered_by_ascending_distance() {
    let (database, _dir) = setup_database().await;
    let caller = create_located_user(&database, "Caller", PARIS.0, PARIS.1).await;

    create_located_user(&database, "Far", 2.60, 48.8566).await;
    create_located_user(&database, "Near", 2.36, 48.8566).await;
    create_located_user(&database, "Mid", 2.45, 48.8566).await;

    let identities = IdentityManager::new(database.pool());
    let origin = GeoPoint::new(PARIS.0, PARIS.1).unwrap();
    let results = identities
        .find_nearby(&origin, 100_000.0, &NearbyFilters::default(), caller.id)
        .await
        .unwrap();

    let names: Vec<&str> = results.iter().map(|r| r.user.name.as_str()).collect();
    assert_eq!(names, vec!["Near", "Mid", "Far"]);
    for pair in results.windows(2) {
        assert!(pair[0].distance_meters <= pair[1].distance_meters);
    }
}

#[tokio::test]
async fn test_caller_and_unlocated_users_are_excluded() {
    let (database, _dir) = setup_database().await;
    let caller = create_located_user(&database, "Caller", PARIS.0, PARIS.1).await;
    create_user(&database, "No Location").await;
    create_located_user(&database, "Neighbor", 2.36, 48.8566).await;

    let identities = IdentityManager::new(database.pool());
    let origin = GeoPoint::new(PARIS.0, PARIS.1).unwrap();
    let results = identities
        .find_nearby(
            &origin,
            DEFAULT_SEARCH_RADIUS_METERS,
            &NearbyFilters::default(),
            caller.id,
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].user.name, "Neighbor");
}

#[tokio::test]
async fn test_attribute_filters_are_conjunctive() {
    let (database, _dir) = setup_database().await;
    let caller = create_located_user(&database, "Caller", PARIS.0, PARIS.1).await;

    let identities = IdentityManager::new(database.pool());

    let wheat_irrigation = create_located_user(&database, "Wheat Irrigation", 2.36, 48.85).await;
    identities
        .update_profile(
            wheat_irrigation.id,
            &ProfileUpdate {
                crops: Some(vec!["wheat".to_owned()]),
                expertise: Some(Some("irrigation".to_owned())),
                equipment: Some(vec!["tractor".to_owned()]),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap();

    let wheat_only = create_located_user(&database, "Wheat Only", 2.37, 48.85).await;
    identities
        .update_profile(
            wheat_only.id,
            &ProfileUpdate {
                crops: Some(vec!["wheat".to_owned()]),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap();

    let origin = GeoPoint::new(PARIS.0, PARIS.1).unwrap();

    let crop_only = identities
        .find_nearby(
            &origin,
            DEFAULT_SEARCH_RADIUS_METERS,
            &NearbyFilters {
                crop: Some("wheat".to_owned()),
                ..NearbyFilters::default()
            },
            caller.id,
        )
        .await
        .unwrap();
    assert_eq!(crop_only.len(), 2);

    let crop_and_expertise = identities
        .find_nearby(
            &origin,
            DEFAULT_SEARCH_RADIUS_METERS,
            &NearbyFilters {
                crop: Some("wheat".to_owned()),
                expertise: Some("irrigation".to_owned()),
                equipment: None,
            },
            caller.id,
        )
        .await
        .unwrap();
    assert_eq!(crop_and_expertise.len(), 1);
    assert_eq!(crop_and_expertise[0].user.name, "Wheat Irrigation");

    let no_match = identities
        .find_nearby(
            &origin,
            DEFAULT_SEARCH_RADIUS_METERS,
            &NearbyFilters {
                crop: Some("rice".to_owned()),
                ..NearbyFilters::default()
            },
            caller.id,
        )
        .await
        .unwrap();
    assert!(no_match.is_empty());
}

#[tokio::test]
async fn test_negative_radius_is_rejected() {
    let (database, _dir) = setup_database().await;
    let caller = create_located_user(&database, "Caller", PARIS.0, PARIS.1).await;

    let identities = IdentityManager::new(database.pool());
    let origin = GeoPoint::new(PARIS.0, PARIS.1).unwrap();
    let error = identities
        .find_nearby(&origin, -1.0, &NearbyFilters::default(), caller.id)
        .await
        .unwrap_err();
    assert_eq!(error.code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn test_zero_radius_matches_only_the_exact_point() {
    let (database, _dir) = setup_database().await;
    let caller = create_located_user(&database, "Caller", PARIS.0, PARIS.1).await;
    create_located_user(&database, "Twin", PARIS.0, PARIS.1).await;
    create_located_user(&database, "Nearby", 2.3523, 48.8566).await;

    let identities = IdentityManager::new(database.pool());
    let origin = GeoPoint::new(PARIS.0, PARIS.1).unwrap();
    let results = identities
        .find_nearby(&origin, 0.0, &NearbyFilters::default(), caller.id)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].user.name, "Twin");
    assert!(results[0].distance_meters.abs() < f64::EPSILON);
}

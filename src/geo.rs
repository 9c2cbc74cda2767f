// ABOUTME: Geospatial primitives for the proximity search
// ABOUTME: Validated points, haversine distance, and radius-derived bounding boxes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

//! Geospatial primitives
//!
//! A [`GeoPoint`] is always a valid (longitude, latitude) pair — longitude
//! first, matching the geospatial-index convention the rest of the system
//! uses. Distance is great-circle (haversine) over a spherical Earth.
//!
//! Planet-scale nearest-within-radius queries cannot afford a linear scan, so
//! [`BoundingBox::around`] derives an index-friendly latitude/longitude window
//! from a radius. The storage layer resolves that window against a B-tree
//! index over `(latitude, longitude)` and the exact haversine distance then
//! filters and orders the candidates.

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Mean Earth radius in meters (IUGG spherical approximation)
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A validated geographic point: longitude ∈ [-180, 180], latitude ∈ [-90, 90]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Latitude in decimal degrees
    pub latitude: f64,
}

impl GeoPoint {
    /// Create a point, validating coordinate ranges
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when either coordinate is non-finite or out of
    /// range.
    pub fn new(longitude: f64, latitude: f64) -> AppResult<Self> {
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::invalid_input(format!(
                "Longitude must be within [-180, 180], got {longitude}"
            )));
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AppError::invalid_input(format!(
                "Latitude must be within [-90, 90], got {latitude}"
            )));
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    /// Great-circle distance to another point, in meters
    #[must_use]
    pub fn distance_meters(&self, other: &Self) -> f64 {
        let lat_a = self.latitude.to_radians();
        let lat_b = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let h = (d_lat / 2.0).sin().powi(2)
            + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

        2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
    }
}

/// Latitude/longitude window enclosing a radius around an origin
///
/// Conservative by construction: every point within the radius lies inside
/// the box, while points inside the box may still fall outside the radius and
/// must be re-checked with the exact distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    /// Compute the window enclosing `radius_meters` around `origin`
    ///
    /// Latitude is clamped at the poles. When the longitude span would wrap
    /// the antimeridian (or the window touches a pole), the box widens to the
    /// full longitude range instead of splitting into two windows; the exact
    /// distance check discards the extra candidates.
    #[must_use]
    pub fn around(origin: &GeoPoint, radius_meters: f64) -> Self {
        let angular = radius_meters / EARTH_RADIUS_METERS;
        let lat_delta = angular.to_degrees();

        let min_latitude = (origin.latitude - lat_delta).max(-90.0);
        let max_latitude = (origin.latitude + lat_delta).min(90.0);

        // Longitude degrees shrink with cos(latitude); use the widest absolute
        // latitude inside the window so the box stays conservative.
        let widest_lat = min_latitude.abs().max(max_latitude.abs()).to_radians();
        let cos_lat = widest_lat.cos();

        let touches_pole = max_latitude >= 90.0 || min_latitude <= -90.0;
        if touches_pole || cos_lat <= f64::EPSILON {
            return Self {
                min_latitude,
                max_latitude,
                min_longitude: -180.0,
                max_longitude: 180.0,
            };
        }

        let lon_delta = (angular / cos_lat).to_degrees();
        if lon_delta >= 180.0
            || origin.longitude - lon_delta < -180.0
            || origin.longitude + lon_delta > 180.0
        {
            return Self {
                min_latitude,
                max_latitude,
                min_longitude: -180.0,
                max_longitude: 180.0,
            };
        }

        Self {
            min_latitude,
            max_latitude,
            min_longitude: origin.longitude - lon_delta,
            max_longitude: origin.longitude + lon_delta,
        }
    }

    /// Whether the point lies inside this window
    #[must_use]
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.latitude >= self.min_latitude
            && point.latitude <= self.max_latitude
            && point.longitude >= self.min_longitude
            && point.longitude <= self.max_longitude
    }
}

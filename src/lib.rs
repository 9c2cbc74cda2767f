// ABOUTME: Main library entry point for the AgriLink farmer connection platform
// ABOUTME: Exposes auth, storage, geo search, messaging, and diagnosis modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

#![deny(unsafe_code)]

//! # AgriLink Server
//!
//! Backend for a farmer connection platform: geo-proximity search over
//! farmer profiles, direct messaging between farmers, and plant disease
//! diagnosis with a community feed of shared results.
//!
//! ## Architecture
//!
//! - **models**: Domain types shared across layers
//! - **database**: SQLite-backed managers owning all SQL per domain
//! - **geo**: Haversine distance and bounding-box candidate selection
//! - **auth**: JWT bearer tokens and bcrypt credential handling
//! - **diagnosis**: The pluggable diagnosis engine behind a trait
//! - **routes**: Thin axum handlers over the managers
//!
//! ## Example
//!
//! ```rust,no_run
//! use agrilink::config::ServerConfig;
//! use agrilink::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("AgriLink configured for port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// JWT authentication and password hashing
pub mod auth;
/// Environment-based configuration
pub mod config;
/// SQLite storage managers
pub mod database;
/// Plant disease diagnosis engine
pub mod diagnosis;
/// Unified error handling
pub mod errors;
/// Geographic distance and bounding boxes
pub mod geo;
/// Structured logging setup
pub mod logging;
/// Domain models
pub mod models;
/// Shared server resources
pub mod resources;
/// HTTP route handlers
pub mod routes;

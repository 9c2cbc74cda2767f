// ABOUTME: Shared server resources handed to every route handler
// ABOUTME: Bundles database, auth manager, diagnosis engine, and config behind one Arc
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

//! Shared server resources
//!
//! One `Arc<ServerResources>` is the router state for every route. Managers
//! are constructed per request from the pool, which is cheap; long-lived
//! pieces (auth keys, the diagnosis engine) live here.

use std::sync::Arc;

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::diagnosis::DiagnosisEngine;

/// Everything a route handler needs, shared across the server
pub struct ServerResources {
    /// Database connection pool and migrations
    pub database: Database,
    /// Token issuing and validation
    pub auth: AuthManager,
    /// Pluggable diagnosis capability
    pub diagnosis_engine: Arc<dyn DiagnosisEngine>,
    /// Server configuration
    pub config: ServerConfig,
}

impl ServerResources {
    /// Bundle the server's shared resources
    #[must_use]
    pub fn new(
        database: Database,
        auth: AuthManager,
        diagnosis_engine: Arc<dyn DiagnosisEngine>,
        config: ServerConfig,
    ) -> Self {
        Self {
            database,
            auth,
            diagnosis_engine,
            config,
        }
    }
}

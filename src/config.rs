// ABOUTME: Environment-based server configuration
// ABOUTME: Reads port, database URL, and JWT settings with development defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

//! Environment-based configuration management

use std::env;

use tracing::warn;

use crate::errors::{AppError, AppResult};

/// Default development JWT secret; never acceptable in production
const DEV_JWT_SECRET: &str = "agrilink-dev-secret";

/// Server configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// SQLite database URL
    pub database_url: String,
    /// Shared secret for JWT signing
    pub jwt_secret: String,
    /// Bearer token lifetime in hours
    pub jwt_expiry_hours: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// `HTTP_PORT` (or legacy `PORT`), `DATABASE_URL`, `JWT_SECRET`, and
    /// `JWT_EXPIRY_HOURS` are recognized; each has a development default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is present but unparsable.
    pub fn from_env() -> AppResult<Self> {
        let http_port = match env::var("HTTP_PORT").or_else(|_| env::var("PORT")) {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|e| AppError::config(format!("Invalid HTTP_PORT '{value}': {e}")))?,
            Err(_) => 5000,
        };

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:agrilink.db".to_owned());

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set; using the development default");
            DEV_JWT_SECRET.to_owned()
        });

        let jwt_expiry_hours = match env::var("JWT_EXPIRY_HOURS") {
            Ok(value) => value.parse::<i64>().map_err(|e| {
                AppError::config(format!("Invalid JWT_EXPIRY_HOURS '{value}': {e}"))
            })?,
            // 7-day token lifetime
            Err(_) => 24 * 7,
        };

        if jwt_expiry_hours <= 0 {
            return Err(AppError::config("JWT_EXPIRY_HOURS must be positive"));
        }

        Ok(Self {
            http_port,
            database_url,
            jwt_secret,
            jwt_expiry_hours,
        })
    }

    /// One-line startup summary, safe to log
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "port={} database={} token_expiry={}h",
            self.http_port, self.database_url, self.jwt_expiry_hours
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_never_contains_secret() {
        let config = ServerConfig {
            http_port: 5000,
            database_url: "sqlite::memory:".to_owned(),
            jwt_secret: "super-secret-value".to_owned(),
            jwt_expiry_hours: 168,
        };
        assert!(!config.summary().contains("super-secret-value"));
    }
}

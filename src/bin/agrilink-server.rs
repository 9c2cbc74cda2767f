// ABOUTME: AgriLink server binary
// ABOUTME: Loads config, opens storage, seeds reference data, and serves HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 AgriLink

//! # AgriLink Server Binary
//!
//! Starts the AgriLink HTTP API: farmer registration and login, proximity
//! search, direct messaging, and plant disease diagnosis.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use agrilink::{
    auth::AuthManager,
    config::ServerConfig,
    database::{Database, DiagnosisManager},
    diagnosis::RandomDiagnosisEngine,
    logging,
    resources::ServerResources,
    routes,
};

#[derive(Parser)]
#[command(name = "agrilink-server")]
#[command(about = "AgriLink - farmer connection platform API")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    logging::init_from_env()?;

    info!("Starting AgriLink server");
    info!("{}", config.summary());

    let database = Database::new(&config.database_url).await?;
    info!("Database initialized");

    DiagnosisManager::new(database.pool()).seed_diseases().await?;

    let auth = AuthManager::new(config.jwt_secret.as_bytes(), config.jwt_expiry_hours);
    let resources = Arc::new(ServerResources::new(
        database,
        auth,
        Arc::new(RandomDiagnosisEngine),
        config.clone(),
    ));

    let app = routes::router(resources);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}

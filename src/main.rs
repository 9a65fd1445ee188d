// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::Context;
use cineboxd::app::{cors_layer, create_router, AppState, VERSION};
use cineboxd::config::Config;
use cineboxd::services::db::PostgresClient;
use cineboxd::services::logging::init_tracing;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing();

    let db_client = Arc::new(
        PostgresClient::new(&config.database_url, config.database_max_connections)
            .await
            .context("Failed to connect to PostgreSQL")?,
    );
    info!(
        max_connections = config.database_max_connections,
        "Connected to PostgreSQL"
    );

    if config.run_migrations {
        db_client
            .migrate()
            .await
            .context("Failed to apply migrations")?;
    }

    let state = AppState::new(db_client, config.genre_cache_ttl());
    let app = create_router(state).layer(cors_layer(&config.cors_allowed_origins));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    info!(
        version = VERSION,
        addr = %config.bind_addr,
        genre_cache_ttl_secs = config.genre_cache_ttl_secs,
        "cineboxd listening"
    );

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

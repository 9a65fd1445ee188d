// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use clap::{ArgAction, Parser};
use std::net::SocketAddr;
use std::time::Duration;

/// Service configuration, read from flags or environment variables.
#[derive(Parser, Debug, Clone)]
#[command(name = "cineboxd")]
#[command(about = "Movie catalog, search and review service")]
pub struct Config {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Upper bound on pooled database connections
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    pub database_max_connections: u32,

    /// Address the HTTP server binds to
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind_addr: SocketAddr,

    /// Lifetime of the cached genre listing, in seconds
    #[arg(long, env = "GENRE_CACHE_TTL_SECS", default_value_t = 600)]
    pub genre_cache_ttl_secs: u64,

    /// Apply embedded migrations at startup
    #[arg(long, env = "RUN_MIGRATIONS", default_value_t = true, action = ArgAction::Set)]
    pub run_migrations: bool,

    /// Allowed CORS origins. Empty allows any origin.
    #[arg(long, env = "CORS_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn genre_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.genre_cache_ttl_secs)
    }
}

// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Movie catalog service: genre-aware search ranking, browsing, reviews and
//! accounts over PostgreSQL.

pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

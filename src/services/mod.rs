// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod auth;
pub mod clock;
pub mod db;
pub mod discovery;
pub mod genre_catalog;
pub mod logging;
pub mod memory;
pub mod reviews;
pub mod search;
pub mod store;

// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Embeds the service version as `CINEBOXD_VERSION`.
//!
//! `CINEBOXD_PATCH_VERSION` replaces the patch segment so release builds can
//! carry their pipeline build number.

use std::env;

fn main() {
    let version = env::var("CARGO_PKG_VERSION").expect("CARGO_PKG_VERSION not set");

    let (major_minor, patch) = match version.rsplit_once('.') {
        Some((head, tail)) if head.matches('.').count() == 1 => (head, tail),
        _ => panic!("Expected MAJOR.MINOR.PATCH in Cargo.toml, got {}", version),
    };

    let patch = env::var("CINEBOXD_PATCH_VERSION")
        .ok()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| patch.to_string());

    println!("cargo:rustc-env=CINEBOXD_VERSION={}.{}", major_minor, patch);

    // sqlx::migrate! embeds the migrations directory
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=migrations");
    println!("cargo:rerun-if-env-changed=CINEBOXD_PATCH_VERSION");
}

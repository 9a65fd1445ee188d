// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Route handlers for the HTTP API.

pub mod auth;
pub mod reviews;
pub mod users;

pub use auth::auth_router;
pub use reviews::reviews_router;
pub use users::users_router;

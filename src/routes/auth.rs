// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Account route handlers.

use crate::app::AppState;
use crate::error::Result;
use crate::models::auth::{AccountResponse, LoginRequest, MessageResponse, RegisterRequest};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

/// Create the account router, nested under `/api/auth`.
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /api/auth/register - Create an account.
#[utoipa::path(post, path = "/api/auth/register", tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, body = AccountResponse),
        (status = 400, body = MessageResponse),
        (status = 409, body = MessageResponse, description = "E-mail already registered"),
    ))]
pub async fn register_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountResponse>)> {
    let user = state.accounts.register(&payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            success: true,
            user: user.into(),
        }),
    ))
}

/// POST /api/auth/login - Check credentials and return the profile.
#[utoipa::path(post, path = "/api/auth/login", tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, body = AccountResponse),
        (status = 401, body = MessageResponse),
    ))]
pub async fn login_handler(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AccountResponse>> {
    let user = state.accounts.login(&payload).await?;
    Ok(Json(AccountResponse {
        success: true,
        user: user.into(),
    }))
}

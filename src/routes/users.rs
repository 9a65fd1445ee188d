// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Profile management route handlers.

use crate::app::AppState;
use crate::error::Result;
use crate::models::auth::{
    AccountResponse, ChangePasswordRequest, DeleteAccountRequest, MessageResponse,
    UpdateProfileRequest, UserStats,
};
use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};

/// Create the user router, merged into `/api`.
pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/users/stats", get(user_stats_handler))
        .route(
            "/users/{handle}",
            get(get_profile_handler)
                .put(update_profile_handler)
                .delete(delete_account_handler),
        )
        .route("/users/{handle}/password", put(change_password_handler))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /api/users/stats - Account and review counts.
#[utoipa::path(get, path = "/api/users/stats", tag = "users",
    responses((status = 200, body = UserStats)))]
pub async fn user_stats_handler(State(state): State<AppState>) -> Result<Json<UserStats>> {
    state.accounts.stats().await.map(Json)
}

/// GET /api/users/{handle} - Public profile.
#[utoipa::path(get, path = "/api/users/{handle}", tag = "users",
    params(("handle" = String, Path, description = "User handle")),
    responses(
        (status = 200, body = AccountResponse),
        (status = 404, body = MessageResponse),
    ))]
pub async fn get_profile_handler(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<AccountResponse>> {
    let user = state.accounts.profile(&handle).await?;
    Ok(Json(AccountResponse {
        success: true,
        user: user.into(),
    }))
}

/// PUT /api/users/{handle} - Change name and/or e-mail.
#[utoipa::path(put, path = "/api/users/{handle}", tag = "users",
    params(("handle" = String, Path, description = "User handle")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, body = AccountResponse),
        (status = 400, body = MessageResponse),
        (status = 404, body = MessageResponse),
        (status = 409, body = MessageResponse, description = "E-mail already registered"),
    ))]
pub async fn update_profile_handler(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<AccountResponse>> {
    let user = state.accounts.update_profile(&handle, &payload).await?;
    Ok(Json(AccountResponse {
        success: true,
        user: user.into(),
    }))
}

/// PUT /api/users/{handle}/password - Replace the password.
#[utoipa::path(put, path = "/api/users/{handle}/password", tag = "users",
    params(("handle" = String, Path, description = "User handle")),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, body = MessageResponse),
        (status = 400, body = MessageResponse),
        (status = 401, body = MessageResponse, description = "Wrong current password"),
    ))]
pub async fn change_password_handler(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    state.accounts.change_password(&handle, &payload).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Password changed".to_string(),
    }))
}

/// DELETE /api/users/{handle} - Delete the account and its reviews.
#[utoipa::path(delete, path = "/api/users/{handle}", tag = "users",
    params(("handle" = String, Path, description = "User handle")),
    request_body = DeleteAccountRequest,
    responses(
        (status = 200, body = MessageResponse),
        (status = 400, body = MessageResponse),
        (status = 401, body = MessageResponse, description = "Wrong password"),
    ))]
pub async fn delete_account_handler(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Json(payload): Json<DeleteAccountRequest>,
) -> Result<Json<MessageResponse>> {
    state.accounts.delete_account(&handle, &payload).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Account deleted".to_string(),
    }))
}

// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Error taxonomy shared by the catalog services and the HTTP layer.

use crate::models::auth::MessageResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors raised by the catalog core and its storage collaborators.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Malformed input that reached the core.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The persistence layer could not serve the request.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness rule was violated (duplicate review, taken e-mail).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid e-mail or password")]
    InvalidCredentials,
}

impl CatalogError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
            CatalogError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::Conflict(_) => StatusCode::CONFLICT,
            CatalogError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, CatalogError::Storage(_))
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            CatalogError::Storage(detail) => {
                tracing::error!(error = %detail, "storage failure while serving request");
                "Internal server error".to_string()
            }
            CatalogError::Validation(msg)
            | CatalogError::NotFound(msg)
            | CatalogError::Conflict(msg) => msg.clone(),
            CatalogError::InvalidCredentials => self.to_string(),
        };

        (
            status,
            Json(MessageResponse {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}

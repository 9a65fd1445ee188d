// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Minimum accepted length of a display name.
pub const MIN_NAME_CHARS: usize = 2;
/// Minimum accepted length of a password.
pub const MIN_PASSWORD_CHARS: usize = 6;

// ============================================================================
// Database Models
// ============================================================================

/// User record from the database. The handle is the public identity used by
/// reviews.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub handle: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// User row joined with its stored password hash. Only the account service
/// ever sees this.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// Account counts aggregated by the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct UserActivity {
    pub total_users: i64,
    /// Users with at least one review
    pub reviewers: i64,
    pub total_reviews: i64,
}

/// Fields needed to insert a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub handle: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

// ============================================================================
// API Request Types
// ============================================================================

/// Request to register a new account.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request to check credentials.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request to change a profile. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Request to replace a password.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Request to delete an account. The password confirms the deletion.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct DeleteAccountRequest {
    pub password: String,
}

// ============================================================================
// API Response Types
// ============================================================================

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub handle: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            handle: user.handle,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Response after registering or logging in.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub success: bool,
    pub user: UserProfile,
}

/// Response of `GET /api/users/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserStats {
    pub total_users: i64,
    pub users_with_reviews: i64,
    pub total_reviews: i64,
    /// Reviews per registered user, 0 when there are no users
    pub average_reviews_per_user: f64,
}

impl From<UserActivity> for UserStats {
    fn from(activity: UserActivity) -> Self {
        let average_reviews_per_user = if activity.total_users > 0 {
            activity.total_reviews as f64 / activity.total_users as f64
        } else {
            0.0
        };
        Self {
            total_users: activity.total_users,
            users_with_reviews: activity.reviewers,
            total_reviews: activity.total_reviews,
            average_reviews_per_user,
        }
    }
}

/// Generic message response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::page::Pagination;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Lowest score on the rating scale.
pub const MIN_SCORE: i16 = 1;
/// Highest score on the rating scale.
pub const MAX_SCORE: i16 = 5;
/// Longest accepted review comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 500;

/// A stored review. At most one exists per (movie, user handle).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Review {
    pub review_id: i64,
    pub movie_id: i64,
    pub user_handle: String,
    pub score: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Review listed on a movie page, with the author's display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MovieReview {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub review: Review,
    pub author_name: String,
}

/// Review listed on a user page, with the reviewed movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserReview {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub review: Review,
    pub movie_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
}

/// Number of a movie's reviews carrying one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct ScoreCount {
    pub score: i16,
    pub count: i64,
}

/// Validated fields for inserting a review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub movie_id: i64,
    pub user_handle: String,
    pub score: i16,
    pub comment: String,
}

/// Order of a movie's review listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSort {
    /// Newest first
    #[default]
    Recent,
    /// Highest score first, newest first among equal scores
    Rating,
    /// Oldest first
    Oldest,
}

// ============================================================================
// API Request Types
// ============================================================================

/// Request body for `POST /api/movies/{id}/reviews`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateReviewRequest {
    pub user_handle: String,
    pub score: i16,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Request body for `PUT /api/movies/{id}/reviews/{handle}`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateReviewRequest {
    pub score: i16,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Query string for review listings.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ReviewListParams {
    pub sort: Option<ReviewSort>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MovieReviewsResponse {
    pub reviews: Vec<MovieReview>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserReviewsResponse {
    pub reviews: Vec<UserReview>,
    pub pagination: Pagination,
}

/// Response of `GET /api/movies/{id}/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MovieReviewStats {
    pub movie_id: i64,
    pub review_count: i64,
    /// Mean score, 0 when the movie has no reviews
    pub average_score: f64,
    /// Review count for every score on the scale, zero included
    pub score_distribution: BTreeMap<i16, i64>,
}

impl MovieReviewStats {
    pub fn from_counts(movie_id: i64, counts: &[ScoreCount]) -> Self {
        let mut score_distribution: BTreeMap<i16, i64> =
            (MIN_SCORE..=MAX_SCORE).map(|score| (score, 0)).collect();
        for entry in counts {
            *score_distribution.entry(entry.score).or_insert(0) += entry.count;
        }

        let review_count: i64 = score_distribution.values().sum();
        let score_sum: i64 = score_distribution
            .iter()
            .map(|(score, count)| i64::from(*score) * count)
            .sum();
        let average_score = if review_count > 0 {
            score_sum as f64 / review_count as f64
        } else {
            0.0
        };

        Self {
            movie_id,
            review_count,
            average_score,
            score_distribution,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponse {
    pub success: bool,
    pub review: Review,
}

// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Review route handlers.

use crate::app::AppState;
use crate::error::Result;
use crate::models::auth::MessageResponse;
use crate::models::review::{
    CreateReviewRequest, MovieReviewStats, MovieReviewsResponse, ReviewListParams,
    ReviewResponse, UpdateReviewRequest, UserReviewsResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

/// Create the review router, merged into `/api`.
pub fn reviews_router() -> Router<AppState> {
    Router::new()
        .route(
            "/movies/{id}/reviews",
            get(movie_reviews_handler).post(create_review_handler),
        )
        .route(
            "/movies/{id}/reviews/{handle}",
            put(update_review_handler).delete(delete_review_handler),
        )
        .route("/movies/{id}/stats", get(movie_stats_handler))
        .route("/users/{handle}/reviews", get(user_reviews_handler))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /api/movies/{id}/reviews - Review a movie once per user.
#[utoipa::path(post, path = "/api/movies/{id}/reviews", tag = "reviews",
    params(("id" = i64, Path, description = "Movie id")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, body = ReviewResponse),
        (status = 400, body = MessageResponse, description = "Score outside 1-5 or comment too long"),
        (status = 404, body = MessageResponse, description = "Unknown movie or user"),
        (status = 409, body = MessageResponse, description = "User already reviewed the movie"),
    ))]
pub async fn create_review_handler(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>)> {
    let review = state.reviews.create(movie_id, &payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ReviewResponse {
            success: true,
            review,
        }),
    ))
}

/// PUT /api/movies/{id}/reviews/{handle} - Change score and comment.
#[utoipa::path(put, path = "/api/movies/{id}/reviews/{handle}", tag = "reviews",
    params(
        ("id" = i64, Path, description = "Movie id"),
        ("handle" = String, Path, description = "Reviewer handle"),
    ),
    request_body = UpdateReviewRequest,
    responses(
        (status = 200, body = ReviewResponse),
        (status = 400, body = MessageResponse),
        (status = 404, body = MessageResponse),
    ))]
pub async fn update_review_handler(
    State(state): State<AppState>,
    Path((movie_id, handle)): Path<(i64, String)>,
    Json(payload): Json<UpdateReviewRequest>,
) -> Result<Json<ReviewResponse>> {
    let review = state.reviews.update(movie_id, &handle, &payload).await?;
    Ok(Json(ReviewResponse {
        success: true,
        review,
    }))
}

/// DELETE /api/movies/{id}/reviews/{handle}
#[utoipa::path(delete, path = "/api/movies/{id}/reviews/{handle}", tag = "reviews",
    params(
        ("id" = i64, Path, description = "Movie id"),
        ("handle" = String, Path, description = "Reviewer handle"),
    ),
    responses(
        (status = 200, body = MessageResponse),
        (status = 404, body = MessageResponse),
    ))]
pub async fn delete_review_handler(
    State(state): State<AppState>,
    Path((movie_id, handle)): Path<(i64, String)>,
) -> Result<Json<MessageResponse>> {
    state.reviews.delete(movie_id, &handle).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Review deleted".to_string(),
    }))
}

/// GET /api/movies/{id}/reviews - Paginated reviews of a movie.
#[utoipa::path(get, path = "/api/movies/{id}/reviews", tag = "reviews",
    params(
        ("id" = i64, Path, description = "Movie id"),
        ("sort" = Option<String>, Query, description = "recent, rating or oldest"),
        ("limit" = Option<i64>, Query, description = "Page size, default 20"),
        ("offset" = Option<i64>, Query, description = "Rows to skip"),
    ),
    responses(
        (status = 200, body = MovieReviewsResponse),
        (status = 404, body = MessageResponse),
    ))]
pub async fn movie_reviews_handler(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
    Query(params): Query<ReviewListParams>,
) -> Result<Json<MovieReviewsResponse>> {
    state.reviews.for_movie(movie_id, &params).await.map(Json)
}

/// GET /api/movies/{id}/stats - Review count, mean score and histogram.
#[utoipa::path(get, path = "/api/movies/{id}/stats", tag = "reviews",
    params(("id" = i64, Path, description = "Movie id")),
    responses(
        (status = 200, body = MovieReviewStats),
        (status = 404, body = MessageResponse),
    ))]
pub async fn movie_stats_handler(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> Result<Json<MovieReviewStats>> {
    state.reviews.movie_stats(movie_id).await.map(Json)
}

/// GET /api/users/{handle}/reviews - Paginated reviews by a user.
#[utoipa::path(get, path = "/api/users/{handle}/reviews", tag = "reviews",
    params(
        ("handle" = String, Path, description = "Reviewer handle"),
        ("limit" = Option<i64>, Query, description = "Page size, default 20"),
        ("offset" = Option<i64>, Query, description = "Rows to skip"),
    ),
    responses((status = 200, body = UserReviewsResponse)))]
pub async fn user_reviews_handler(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Query(params): Query<ReviewListParams>,
) -> Result<Json<UserReviewsResponse>> {
    state.reviews.for_user(&handle, &params).await.map(Json)
}

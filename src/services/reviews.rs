// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::error::{CatalogError, Result};
use crate::models::page::{page_window, Pagination};
use crate::models::review::{
    CreateReviewRequest, MovieReviewStats, MovieReviewsResponse, NewReview, Review,
    ReviewListParams, UpdateReviewRequest, UserReviewsResponse, MAX_COMMENT_CHARS, MAX_SCORE,
    MIN_SCORE,
};
use crate::services::store::{CatalogStore, ReviewStore};
use std::sync::Arc;
use tracing::info;

/// Validate a score against the 1-5 scale.
pub fn validate_score(score: i16) -> Result<()> {
    if (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(())
    } else {
        Err(CatalogError::Validation(format!(
            "score must be between {} and {}",
            MIN_SCORE, MAX_SCORE
        )))
    }
}

/// Trim a comment and enforce the length limit. Missing comments are empty.
pub fn normalize_comment(comment: Option<&str>) -> Result<String> {
    let comment = comment.unwrap_or_default().trim();
    if comment.chars().count() > MAX_COMMENT_CHARS {
        return Err(CatalogError::Validation(format!(
            "comment must be at most {} characters",
            MAX_COMMENT_CHARS
        )));
    }
    Ok(comment.to_string())
}

/// Review workflows on top of the review and catalog stores.
pub struct ReviewService {
    reviews: Arc<dyn ReviewStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl ReviewService {
    pub fn new(reviews: Arc<dyn ReviewStore>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self { reviews, catalog }
    }

    pub async fn create(&self, movie_id: i64, request: &CreateReviewRequest) -> Result<Review> {
        let user_handle = request.user_handle.trim();
        if user_handle.is_empty() {
            return Err(CatalogError::Validation(
                "user_handle is required".to_string(),
            ));
        }
        validate_score(request.score)?;
        let comment = normalize_comment(request.comment.as_deref())?;

        let review = self
            .reviews
            .insert_review(&NewReview {
                movie_id,
                user_handle: user_handle.to_string(),
                score: request.score,
                comment,
            })
            .await?;

        info!(movie_id, user = %review.user_handle, score = review.score, "Review created");
        Ok(review)
    }

    pub async fn update(
        &self,
        movie_id: i64,
        user_handle: &str,
        request: &UpdateReviewRequest,
    ) -> Result<Review> {
        validate_score(request.score)?;
        let comment = normalize_comment(request.comment.as_deref())?;

        self.reviews
            .update_review(movie_id, user_handle, request.score, &comment)
            .await?
            .ok_or_else(|| review_not_found(movie_id, user_handle))
    }

    pub async fn delete(&self, movie_id: i64, user_handle: &str) -> Result<()> {
        if self.reviews.delete_review(movie_id, user_handle).await? {
            info!(movie_id, user = %user_handle, "Review deleted");
            Ok(())
        } else {
            Err(review_not_found(movie_id, user_handle))
        }
    }

    /// A page of a movie's reviews. Unknown movies are `NotFound`.
    pub async fn for_movie(
        &self,
        movie_id: i64,
        params: &ReviewListParams,
    ) -> Result<MovieReviewsResponse> {
        if self.catalog.get_movie(movie_id).await?.is_none() {
            return Err(CatalogError::NotFound(format!("movie {}", movie_id)));
        }

        let (limit, offset) = page_window(params.limit, params.offset);
        let (reviews, total) = self
            .reviews
            .movie_reviews(movie_id, params.sort.unwrap_or_default(), limit, offset)
            .await?;

        Ok(MovieReviewsResponse {
            reviews,
            pagination: Pagination::new(total, limit, offset),
        })
    }

    /// Review count, mean score and score histogram of a movie.
    pub async fn movie_stats(&self, movie_id: i64) -> Result<MovieReviewStats> {
        if self.catalog.get_movie(movie_id).await?.is_none() {
            return Err(CatalogError::NotFound(format!("movie {}", movie_id)));
        }
        let counts = self.reviews.score_counts(movie_id).await?;
        Ok(MovieReviewStats::from_counts(movie_id, &counts))
    }

    /// A page of a user's reviews, newest first.
    pub async fn for_user(
        &self,
        user_handle: &str,
        params: &ReviewListParams,
    ) -> Result<UserReviewsResponse> {
        let (limit, offset) = page_window(params.limit, params.offset);
        let (reviews, total) = self
            .reviews
            .user_reviews(user_handle, limit, offset)
            .await?;

        Ok(UserReviewsResponse {
            reviews,
            pagination: Pagination::new(total, limit, offset),
        })
    }
}

fn review_not_found(movie_id: i64, user_handle: &str) -> CatalogError {
    CatalogError::NotFound(format!(
        "review of movie {} by {}",
        movie_id, user_handle
    ))
}

// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Storage ports consumed by the catalog services.
//!
//! Each lookup returns one narrow row shape; genre and studio names arrive
//! concatenated with [`crate::models::movie::LIST_SEPARATOR`] and are split by
//! the core.

use crate::error::Result;
use crate::models::auth::{NewUser, User, UserActivity, UserCredentials};
use crate::models::movie::{
    CastMember, CatalogStats, GenreSummary, MovieCategory, MovieRow, TitleMatchRow,
};
use crate::models::review::{
    MovieReview, NewReview, Review, ReviewSort, ScoreCount, UserReview,
};
use async_trait::async_trait;

/// Read access to movies and genres, plus the genre-assignment write path.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Every genre with its distinct movie count, zero included, in
    /// [`GenreSummary::cmp_by_name`] order.
    async fn query_genre_aggregates(&self) -> Result<Vec<GenreSummary>>;

    /// Movies carrying a genre that contains `term` or is contained in it,
    /// case-insensitively.
    async fn query_movies_by_genre_substring(&self, term: &str) -> Result<Vec<MovieRow>>;

    /// Movies whose title contains `term`, case-insensitively.
    async fn query_movies_by_title_substring(&self, term: &str) -> Result<Vec<TitleMatchRow>>;

    /// Superset of the movies any general-search rule can match: title,
    /// genre, studio on `term` and release year on `year_term`.
    async fn query_all_candidate_movies_for_general_search(
        &self,
        term: &str,
        year_term: &str,
    ) -> Result<Vec<MovieRow>>;

    /// Listing for a browsing category. `None` means no limit.
    async fn list_movies(&self, category: &MovieCategory, limit: Option<i64>)
        -> Result<Vec<MovieRow>>;

    async fn get_movie(&self, movie_id: i64) -> Result<Option<MovieRow>>;

    async fn movie_cast(&self, movie_id: i64) -> Result<Vec<CastMember>>;

    /// Replace the genre set of a movie, creating unknown genre names.
    /// Callers must invalidate any cached genre listing afterwards.
    async fn set_movie_genres(&self, movie_id: i64, genres: &[String]) -> Result<()>;

    async fn catalog_stats(&self) -> Result<CatalogStats>;

    /// Cheap round trip used by the health check.
    async fn ping(&self) -> Result<()>;
}

/// Review persistence. Uniqueness of (movie, user) is the store's job.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Insert a review. Fails with `Conflict` if the user already reviewed
    /// the movie and `NotFound` if the movie or user does not exist.
    async fn insert_review(&self, review: &NewReview) -> Result<Review>;

    async fn update_review(
        &self,
        movie_id: i64,
        user_handle: &str,
        score: i16,
        comment: &str,
    ) -> Result<Option<Review>>;

    /// Returns whether a review was removed.
    async fn delete_review(&self, movie_id: i64, user_handle: &str) -> Result<bool>;

    /// A page of a movie's reviews and the movie's total review count.
    async fn movie_reviews(
        &self,
        movie_id: i64,
        sort: ReviewSort,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<MovieReview>, i64)>;

    /// A page of a user's reviews, newest first, and the user's total.
    async fn user_reviews(
        &self,
        user_handle: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<UserReview>, i64)>;

    /// Review count per score for a movie. Scores nobody gave are omitted.
    async fn score_counts(&self, movie_id: i64) -> Result<Vec<ScoreCount>>;
}

/// Account persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with `Conflict` on a taken handle or e-mail.
    async fn create_user(&self, user: &NewUser) -> Result<User>;

    async fn handle_exists(&self, handle: &str) -> Result<bool>;

    async fn email_exists(&self, email: &str) -> Result<bool>;

    async fn get_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>>;

    async fn get_credentials(&self, handle: &str) -> Result<Option<UserCredentials>>;

    async fn get_user(&self, handle: &str) -> Result<Option<User>>;

    /// Change name and/or e-mail. `None` when the user does not exist;
    /// `Conflict` when the e-mail belongs to another account.
    async fn update_user(
        &self,
        handle: &str,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>>;

    /// Returns whether the user exists.
    async fn set_password_hash(&self, handle: &str, password_hash: &str) -> Result<bool>;

    /// Remove a user and their reviews. Returns whether the user existed.
    async fn delete_user(&self, handle: &str) -> Result<bool>;

    async fn user_activity(&self) -> Result<UserActivity>;
}

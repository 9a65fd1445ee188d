// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! In-process catalog store.
//!
//! Mirrors the PostgreSQL store's row shapes and ordering so the search core
//! behaves the same on either backend. The binary always runs on PostgreSQL;
//! this store backs the unit and HTTP integration tests.

use crate::error::{CatalogError, Result};
use crate::models::auth::{NewUser, User, UserActivity, UserCredentials};
use crate::models::movie::{
    join_list, normalize_names, CastMember, CatalogStats, GenreSummary, MovieCategory, MovieRow,
    TitleMatchRow,
};
use crate::models::review::{
    MovieReview, NewReview, Review, ReviewSort, ScoreCount, UserReview,
};
use crate::services::search::contains_either;
use crate::services::store::{CatalogStore, ReviewStore, UserStore};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Movie to seed into an [`InMemoryCatalog`].
#[derive(Debug, Clone)]
pub struct MovieSeed {
    pub title: String,
    pub release_date: NaiveDate,
    pub runtime_minutes: Option<i32>,
    pub synopsis: Option<String>,
    pub poster_url: Option<String>,
    pub genres: Vec<String>,
    pub studios: Vec<String>,
    /// (actor name, role)
    pub cast: Vec<(String, String)>,
}

impl MovieSeed {
    pub fn new(title: impl Into<String>, release_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            release_date,
            runtime_minutes: None,
            synopsis: None,
            poster_url: None,
            genres: Vec::new(),
            studios: Vec::new(),
            cast: Vec::new(),
        }
    }

    pub fn genre(mut self, name: impl Into<String>) -> Self {
        self.genres.push(name.into());
        self
    }

    pub fn studio(mut self, name: impl Into<String>) -> Self {
        self.studios.push(name.into());
        self
    }

    pub fn actor(mut self, name: impl Into<String>, role: impl Into<String>) -> Self {
        self.cast.push((name.into(), role.into()));
        self
    }

    pub fn synopsis(mut self, text: impl Into<String>) -> Self {
        self.synopsis = Some(text.into());
        self
    }

    pub fn runtime(mut self, minutes: i32) -> Self {
        self.runtime_minutes = Some(minutes);
        self
    }
}

#[derive(Debug, Clone)]
struct MovieRecord {
    id: i64,
    title: String,
    release_date: NaiveDate,
    runtime_minutes: Option<i32>,
    synopsis: Option<String>,
    poster_url: Option<String>,
    genre_ids: BTreeSet<i32>,
    studio_ids: BTreeSet<i32>,
}

#[derive(Debug, Clone)]
struct CastRecord {
    movie_id: i64,
    actor_id: i32,
    role: String,
}

#[derive(Debug, Default)]
struct State {
    genres: Vec<(i32, String)>,
    studios: Vec<(i32, String)>,
    actors: Vec<(i32, String)>,
    movies: Vec<MovieRecord>,
    cast: Vec<CastRecord>,
    users: Vec<UserCredentials>,
    reviews: Vec<Review>,
}

impl State {
    fn genre_id(&mut self, name: &str) -> i32 {
        named_id(&mut self.genres, name)
    }

    fn studio_id(&mut self, name: &str) -> i32 {
        named_id(&mut self.studios, name)
    }

    fn actor_id(&mut self, name: &str) -> i32 {
        named_id(&mut self.actors, name)
    }

    fn names(table: &[(i32, String)], ids: &BTreeSet<i32>) -> Vec<String> {
        let mut names: Vec<String> = table
            .iter()
            .filter(|(id, _)| ids.contains(id))
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        names
    }

    fn genre_names(&self, movie: &MovieRecord) -> Vec<String> {
        Self::names(&self.genres, &movie.genre_ids)
    }

    fn studio_names(&self, movie: &MovieRecord) -> Vec<String> {
        Self::names(&self.studios, &movie.studio_ids)
    }

    fn row(&self, movie: &MovieRecord) -> MovieRow {
        let scores: Vec<f64> = self
            .reviews
            .iter()
            .filter(|r| r.movie_id == movie.id)
            .map(|r| f64::from(r.score))
            .collect();
        let rating_average = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        MovieRow {
            id: movie.id,
            title: movie.title.clone(),
            release_date: movie.release_date,
            runtime_minutes: movie.runtime_minutes,
            synopsis: movie.synopsis.clone(),
            poster_url: movie.poster_url.clone(),
            genres: join_list(&self.genre_names(movie)),
            studios: join_list(&self.studio_names(movie)),
            rating_average,
            rating_count: scores.len() as i64,
        }
    }

    fn rows_where(&self, predicate: impl Fn(&MovieRecord) -> bool) -> Vec<MovieRow> {
        self.movies
            .iter()
            .filter(|movie| predicate(movie))
            .map(|movie| self.row(movie))
            .collect()
    }

    fn user(&self, handle: &str) -> Option<&UserCredentials> {
        self.users.iter().find(|u| u.user.handle == handle)
    }

    fn user_mut(&mut self, handle: &str) -> Option<&mut UserCredentials> {
        self.users.iter_mut().find(|u| u.user.handle == handle)
    }
}

fn named_id(table: &mut Vec<(i32, String)>, name: &str) -> i32 {
    if let Some((id, _)) = table.iter().find(|(_, existing)| existing == name) {
        return *id;
    }
    let id = table.len() as i32 + 1;
    table.push((id, name.to_string()));
    id
}

fn newest_first(rows: &mut [MovieRow]) {
    rows.sort_by(|a, b| b.release_date.cmp(&a.release_date).then(a.id.cmp(&b.id)));
}

fn take(rows: Vec<MovieRow>, limit: Option<i64>) -> Vec<MovieRow> {
    match limit {
        Some(limit) => rows.into_iter().take(limit.max(0) as usize).collect(),
        None => rows,
    }
}

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

/// Catalog, review and account store held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: RwLock<State>,
    unavailable: AtomicBool,
    genre_aggregate_queries: AtomicUsize,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a storage error (or recover).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of genre aggregation reads served so far.
    pub fn genre_aggregate_queries(&self) -> usize {
        self.genre_aggregate_queries.load(Ordering::SeqCst)
    }

    pub async fn add_genre(&self, name: &str) -> i32 {
        self.state.write().await.genre_id(name)
    }

    pub async fn add_studio(&self, name: &str) -> i32 {
        self.state.write().await.studio_id(name)
    }

    /// Insert a movie, creating its genres, studios and actors. Returns the id.
    pub async fn insert_movie(&self, seed: MovieSeed) -> i64 {
        let mut state = self.state.write().await;
        let id = state.movies.iter().map(|m| m.id).max().unwrap_or(0) + 1;

        let genre_ids = seed.genres.iter().map(|g| state.genre_id(g)).collect();
        let studio_ids = seed.studios.iter().map(|s| state.studio_id(s)).collect();
        for (actor, role) in &seed.cast {
            let actor_id = state.actor_id(actor);
            state.cast.push(CastRecord {
                movie_id: id,
                actor_id,
                role: role.clone(),
            });
        }

        state.movies.push(MovieRecord {
            id,
            title: seed.title,
            release_date: seed.release_date,
            runtime_minutes: seed.runtime_minutes,
            synopsis: seed.synopsis,
            poster_url: seed.poster_url,
            genre_ids,
            studio_ids,
        });
        id
    }

    /// Add reviews with the given scores from generated reviewer accounts.
    pub async fn seed_ratings(&self, movie_id: i64, scores: &[i16]) {
        let mut state = self.state.write().await;
        for score in scores {
            let review_id = state.reviews.iter().map(|r| r.review_id).max().unwrap_or(0) + 1;
            let handle = format!("reviewer{}", review_id);
            state.users.push(UserCredentials {
                user: User {
                    handle: handle.clone(),
                    name: handle.clone(),
                    email: format!("{}@example.com", handle),
                    created_at: Utc::now(),
                },
                password_hash: String::new(),
            });
            state.reviews.push(Review {
                review_id,
                movie_id,
                user_handle: handle,
                score: *score,
                comment: String::new(),
                created_at: Utc::now(),
            });
        }
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(CatalogError::Storage("in-memory store is unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn query_genre_aggregates(&self) -> Result<Vec<GenreSummary>> {
        self.genre_aggregate_queries.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let state = self.state.read().await;

        let mut genres: Vec<GenreSummary> = state
            .genres
            .iter()
            .map(|(id, name)| GenreSummary {
                id: *id,
                name: name.clone(),
                movie_count: state
                    .movies
                    .iter()
                    .filter(|m| m.genre_ids.contains(id))
                    .count() as i64,
            })
            .collect();
        genres.sort_by(GenreSummary::cmp_by_name);
        Ok(genres)
    }

    async fn query_movies_by_genre_substring(&self, term: &str) -> Result<Vec<MovieRow>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.rows_where(|movie| {
            state
                .genre_names(movie)
                .iter()
                .any(|genre| contains_either(genre, term))
        }))
    }

    async fn query_movies_by_title_substring(&self, term: &str) -> Result<Vec<TitleMatchRow>> {
        self.check_available()?;
        let state = self.state.read().await;
        let term = term.to_lowercase();
        Ok(state
            .rows_where(|movie| movie.title.to_lowercase().contains(&term))
            .into_iter()
            .map(|movie| TitleMatchRow {
                exact_match: movie.title.to_lowercase() == term,
                movie,
            })
            .collect())
    }

    async fn query_all_candidate_movies_for_general_search(
        &self,
        term: &str,
        year_term: &str,
    ) -> Result<Vec<MovieRow>> {
        self.check_available()?;
        let state = self.state.read().await;
        let lowered = term.to_lowercase();
        Ok(state.rows_where(|movie| {
            movie.title.to_lowercase().contains(&lowered)
                || state
                    .genre_names(movie)
                    .iter()
                    .any(|genre| contains_either(genre, term))
                || state
                    .studio_names(movie)
                    .iter()
                    .any(|studio| studio.to_lowercase().contains(&lowered))
                || movie.release_date.year().to_string().contains(year_term)
        }))
    }

    async fn list_movies(
        &self,
        category: &MovieCategory,
        limit: Option<i64>,
    ) -> Result<Vec<MovieRow>> {
        self.check_available()?;
        let state = self.state.read().await;

        let rows = match category {
            MovieCategory::All => {
                let mut rows = state.rows_where(|_| true);
                newest_first(&mut rows);
                rows
            }
            MovieCategory::TopRated => {
                let mut rows: Vec<MovieRow> = state
                    .rows_where(|_| true)
                    .into_iter()
                    .filter(|row| row.rating_count > 0)
                    .collect();
                rows.sort_by(|a, b| {
                    b.rating_average
                        .total_cmp(&a.rating_average)
                        .then(b.rating_count.cmp(&a.rating_count))
                        .then(a.id.cmp(&b.id))
                });
                rows
            }
            MovieCategory::Genre(name) => {
                let name = name.to_lowercase();
                let mut rows = state.rows_where(|movie| {
                    state
                        .genre_names(movie)
                        .iter()
                        .any(|genre| genre.to_lowercase().contains(&name))
                });
                newest_first(&mut rows);
                rows
            }
        };

        Ok(take(rows, limit))
    }

    async fn get_movie(&self, movie_id: i64) -> Result<Option<MovieRow>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state
            .movies
            .iter()
            .find(|m| m.id == movie_id)
            .map(|m| state.row(m)))
    }

    async fn movie_cast(&self, movie_id: i64) -> Result<Vec<CastMember>> {
        self.check_available()?;
        let state = self.state.read().await;

        let mut cast: Vec<CastMember> = state
            .cast
            .iter()
            .filter(|c| c.movie_id == movie_id)
            .filter_map(|c| {
                state
                    .actors
                    .iter()
                    .find(|(id, _)| *id == c.actor_id)
                    .map(|(id, name)| CastMember {
                        actor_id: *id,
                        name: name.clone(),
                        role: c.role.clone(),
                    })
            })
            .collect();
        cast.sort_by(|a, b| a.name.cmp(&b.name).then(a.role.cmp(&b.role)));
        Ok(cast)
    }

    async fn set_movie_genres(&self, movie_id: i64, genres: &[String]) -> Result<()> {
        self.check_available()?;
        let mut state = self.state.write().await;

        if !state.movies.iter().any(|m| m.id == movie_id) {
            return Err(CatalogError::NotFound(format!("movie {}", movie_id)));
        }
        let genre_ids: BTreeSet<i32> = normalize_names(genres)
            .iter()
            .map(|name| state.genre_id(name))
            .collect();
        if let Some(movie) = state.movies.iter_mut().find(|m| m.id == movie_id) {
            movie.genre_ids = genre_ids;
        }
        Ok(())
    }

    async fn catalog_stats(&self) -> Result<CatalogStats> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(CatalogStats {
            total_movies: state.movies.len() as i64,
            total_users: state.users.len() as i64,
            total_reviews: state.reviews.len() as i64,
            total_actors: state.actors.len() as i64,
        })
    }

    async fn ping(&self) -> Result<()> {
        self.check_available()
    }
}

#[async_trait]
impl ReviewStore for InMemoryCatalog {
    async fn insert_review(&self, review: &NewReview) -> Result<Review> {
        self.check_available()?;
        let mut state = self.state.write().await;

        if !state.movies.iter().any(|m| m.id == review.movie_id) {
            return Err(CatalogError::NotFound(format!("movie {}", review.movie_id)));
        }
        if state.user(&review.user_handle).is_none() {
            return Err(CatalogError::NotFound(format!("user {}", review.user_handle)));
        }
        if state
            .reviews
            .iter()
            .any(|r| r.movie_id == review.movie_id && r.user_handle == review.user_handle)
        {
            return Err(CatalogError::Conflict(format!(
                "user {} has already reviewed movie {}",
                review.user_handle, review.movie_id
            )));
        }

        let stored = Review {
            review_id: state.reviews.iter().map(|r| r.review_id).max().unwrap_or(0) + 1,
            movie_id: review.movie_id,
            user_handle: review.user_handle.clone(),
            score: review.score,
            comment: review.comment.clone(),
            created_at: Utc::now(),
        };
        state.reviews.push(stored.clone());
        Ok(stored)
    }

    async fn update_review(
        &self,
        movie_id: i64,
        user_handle: &str,
        score: i16,
        comment: &str,
    ) -> Result<Option<Review>> {
        self.check_available()?;
        let mut state = self.state.write().await;

        Ok(state
            .reviews
            .iter_mut()
            .find(|r| r.movie_id == movie_id && r.user_handle == user_handle)
            .map(|review| {
                review.score = score;
                review.comment = comment.to_string();
                review.clone()
            }))
    }

    async fn delete_review(&self, movie_id: i64, user_handle: &str) -> Result<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let before = state.reviews.len();
        state
            .reviews
            .retain(|r| !(r.movie_id == movie_id && r.user_handle == user_handle));
        Ok(state.reviews.len() < before)
    }

    async fn movie_reviews(
        &self,
        movie_id: i64,
        sort: ReviewSort,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<MovieReview>, i64)> {
        self.check_available()?;
        let state = self.state.read().await;

        let mut reviews: Vec<MovieReview> = state
            .reviews
            .iter()
            .filter(|r| r.movie_id == movie_id)
            .filter_map(|r| {
                state.user(&r.user_handle).map(|author| MovieReview {
                    review: r.clone(),
                    author_name: author.user.name.clone(),
                })
            })
            .collect();
        let total = reviews.len() as i64;

        reviews.sort_by(|a, b| {
            let (a, b) = (&a.review, &b.review);
            let newest = (b.created_at, b.review_id).cmp(&(a.created_at, a.review_id));
            match sort {
                ReviewSort::Recent => newest,
                ReviewSort::Rating => b.score.cmp(&a.score).then(newest),
                ReviewSort::Oldest => newest.reverse(),
            }
        });

        Ok((page(reviews, limit, offset), total))
    }

    async fn user_reviews(
        &self,
        user_handle: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<UserReview>, i64)> {
        self.check_available()?;
        let state = self.state.read().await;

        let mut reviews: Vec<UserReview> = state
            .reviews
            .iter()
            .filter(|r| r.user_handle == user_handle)
            .filter_map(|r| {
                state
                    .movies
                    .iter()
                    .find(|m| m.id == r.movie_id)
                    .map(|movie| UserReview {
                        review: r.clone(),
                        movie_title: movie.title.clone(),
                        poster_url: movie.poster_url.clone(),
                    })
            })
            .collect();
        let total = reviews.len() as i64;

        reviews.sort_by(|a, b| {
            (b.review.created_at, b.review.review_id).cmp(&(a.review.created_at, a.review.review_id))
        });

        Ok((page(reviews, limit, offset), total))
    }

    async fn score_counts(&self, movie_id: i64) -> Result<Vec<ScoreCount>> {
        self.check_available()?;
        let state = self.state.read().await;

        let mut counts: Vec<ScoreCount> = Vec::new();
        for review in state.reviews.iter().filter(|r| r.movie_id == movie_id) {
            match counts.iter_mut().find(|c| c.score == review.score) {
                Some(entry) => entry.count += 1,
                None => counts.push(ScoreCount {
                    score: review.score,
                    count: 1,
                }),
            }
        }
        counts.sort_by_key(|c| c.score);
        Ok(counts)
    }
}

#[async_trait]
impl UserStore for InMemoryCatalog {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        self.check_available()?;
        let mut state = self.state.write().await;

        if state.user(&user.handle).is_some() {
            return Err(CatalogError::Conflict(format!(
                "handle {} is taken",
                user.handle
            )));
        }
        if state
            .users
            .iter()
            .any(|u| u.user.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(CatalogError::Conflict(
                "e-mail is already registered".to_string(),
            ));
        }

        let created = User {
            handle: user.handle.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: Utc::now(),
        };
        state.users.push(UserCredentials {
            user: created.clone(),
            password_hash: user.password_hash.clone(),
        });
        Ok(created)
    }

    async fn handle_exists(&self, handle: &str) -> Result<bool> {
        self.check_available()?;
        Ok(self.state.read().await.user(handle).is_some())
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        self.check_available()?;
        Ok(self
            .state
            .read()
            .await
            .users
            .iter()
            .any(|u| u.user.email.eq_ignore_ascii_case(email)))
    }

    async fn get_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        self.check_available()?;
        Ok(self
            .state
            .read()
            .await
            .users
            .iter()
            .find(|u| u.user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_credentials(&self, handle: &str) -> Result<Option<UserCredentials>> {
        self.check_available()?;
        Ok(self.state.read().await.user(handle).cloned())
    }

    async fn get_user(&self, handle: &str) -> Result<Option<User>> {
        self.check_available()?;
        Ok(self
            .state
            .read()
            .await
            .user(handle)
            .map(|credentials| credentials.user.clone()))
    }

    async fn update_user(
        &self,
        handle: &str,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>> {
        self.check_available()?;
        let mut state = self.state.write().await;

        if let Some(email) = email {
            if state
                .users
                .iter()
                .any(|u| u.user.handle != handle && u.user.email.eq_ignore_ascii_case(email))
            {
                return Err(CatalogError::Conflict(
                    "e-mail is already registered".to_string(),
                ));
            }
        }

        Ok(state.user_mut(handle).map(|credentials| {
            if let Some(name) = name {
                credentials.user.name = name.to_string();
            }
            if let Some(email) = email {
                credentials.user.email = email.to_string();
            }
            credentials.user.clone()
        }))
    }

    async fn set_password_hash(&self, handle: &str, password_hash: &str) -> Result<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        Ok(state
            .user_mut(handle)
            .map(|credentials| credentials.password_hash = password_hash.to_string())
            .is_some())
    }

    async fn delete_user(&self, handle: &str) -> Result<bool> {
        self.check_available()?;
        let mut state = self.state.write().await;
        let before = state.users.len();
        state.users.retain(|u| u.user.handle != handle);
        if state.users.len() == before {
            return Ok(false);
        }
        state.reviews.retain(|r| r.user_handle != handle);
        Ok(true)
    }

    async fn user_activity(&self) -> Result<UserActivity> {
        self.check_available()?;
        let state = self.state.read().await;
        let reviewers: BTreeSet<&str> = state
            .reviews
            .iter()
            .map(|r| r.user_handle.as_str())
            .collect();
        Ok(UserActivity {
            total_users: state.users.len() as i64,
            reviewers: reviewers.len() as i64,
            total_reviews: state.reviews.len() as i64,
        })
    }
}

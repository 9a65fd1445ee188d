// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::error::{CatalogError, Result};
use crate::models::auth::{NewUser, User, UserActivity, UserCredentials};
use crate::models::movie::{
    normalize_names, CastMember, CatalogStats, GenreSummary, MovieCategory, MovieRow,
    TitleMatchRow,
};
use crate::models::review::{
    MovieReview, NewReview, Review, ReviewSort, ScoreCount, UserReview,
};
use crate::services::store::{CatalogStore, ReviewStore, UserStore};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};

/// Columns of [`MovieRow`], selected from `movies m`. Genre and studio names
/// are aggregated with the `", "` separator; ratings come from correlated
/// subqueries so the joins never inflate the review count.
const MOVIE_COLUMNS: &str = r#"
    m.id,
    m.title,
    m.release_date,
    m.runtime_minutes,
    m.synopsis,
    m.poster_url,
    (SELECT string_agg(g.name, ', ' ORDER BY g.name)
       FROM movie_genres mg JOIN genres g ON g.id = mg.genre_id
      WHERE mg.movie_id = m.id) AS genres,
    (SELECT string_agg(s.name, ', ' ORDER BY s.name)
       FROM movie_studios ms JOIN studios s ON s.id = ms.studio_id
      WHERE ms.movie_id = m.id) AS studios,
    COALESCE((SELECT AVG(r.score)::float8 FROM reviews r WHERE r.movie_id = m.id), 0::float8)
        AS rating_average,
    (SELECT COUNT(*) FROM reviews r WHERE r.movie_id = m.id) AS rating_count
"#;

/// Genre containment in either direction against bind parameter `$1`.
const GENRE_MATCHES_TERM: &str = r#"
    EXISTS (
        SELECT 1 FROM movie_genres mg JOIN genres g ON g.id = mg.genre_id
         WHERE mg.movie_id = m.id
           AND (strpos(lower(g.name), lower($1)) > 0 OR strpos(lower($1), lower(g.name)) > 0)
    )
"#;

const REVIEW_COLUMNS: &str =
    "r.review_id, r.movie_id, r.user_handle, r.score, r.comment, r.created_at";

/// Wrap a sqlx failure into a storage error with context.
fn storage_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> CatalogError {
    move |e| CatalogError::Storage(format!("{}: {}", context, e))
}

/// Name of the violated constraint, if the error came from the database.
fn violated_constraint(error: &sqlx::Error) -> Option<String> {
    error
        .as_database_error()
        .and_then(|db_err| db_err.constraint())
        .map(str::to_string)
}

/// PostgreSQL client for the movie catalog, reviews and accounts.
#[derive(Clone, Debug)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Open a connection pool.
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(storage_err("Failed to connect to PostgreSQL"))?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| CatalogError::Storage(format!("Failed to run migrations: {}", e)))?;

        info!("Database migrations applied");
        Ok(())
    }

    async fn fetch_movies(&self, sql: &str, term: &str) -> Result<Vec<MovieRow>> {
        sqlx::query_as::<_, MovieRow>(sql)
            .bind(term)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err("Failed to query movies"))
    }
}

#[async_trait]
impl CatalogStore for PostgresClient {
    async fn query_genre_aggregates(&self) -> Result<Vec<GenreSummary>> {
        let query = r#"SELECT g.id, g.name, COUNT(DISTINCT mg.movie_id) AS movie_count
                       FROM genres g
                       LEFT JOIN movie_genres mg ON mg.genre_id = g.id
                       GROUP BY g.id, g.name
                       ORDER BY lower(g.name) COLLATE "C", g.name COLLATE "C""#;

        let genres = sqlx::query_as::<_, GenreSummary>(query)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err("Failed to aggregate genres"))?;

        debug!(count = genres.len(), "Loaded genre aggregates");
        Ok(genres)
    }

    async fn query_movies_by_genre_substring(&self, term: &str) -> Result<Vec<MovieRow>> {
        let query = format!(
            "SELECT {MOVIE_COLUMNS} FROM movies m WHERE {GENRE_MATCHES_TERM} ORDER BY m.id"
        );
        self.fetch_movies(&query, term).await
    }

    async fn query_movies_by_title_substring(&self, term: &str) -> Result<Vec<TitleMatchRow>> {
        let query = format!(
            "SELECT {MOVIE_COLUMNS}, lower(m.title) = lower($1) AS exact_match
             FROM movies m
             WHERE strpos(lower(m.title), lower($1)) > 0
             ORDER BY m.id"
        );

        sqlx::query_as::<_, TitleMatchRow>(&query)
            .bind(term)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err("Failed to query movies by title"))
    }

    async fn query_all_candidate_movies_for_general_search(
        &self,
        term: &str,
        year_term: &str,
    ) -> Result<Vec<MovieRow>> {
        let query = format!(
            "SELECT {MOVIE_COLUMNS}
             FROM movies m
             WHERE strpos(lower(m.title), lower($1)) > 0
                OR {GENRE_MATCHES_TERM}
                OR EXISTS (
                    SELECT 1 FROM movie_studios ms JOIN studios s ON s.id = ms.studio_id
                     WHERE ms.movie_id = m.id AND strpos(lower(s.name), lower($1)) > 0
                )
                OR strpos(to_char(m.release_date, 'YYYY'), $2) > 0
             ORDER BY m.id"
        );

        sqlx::query_as::<_, MovieRow>(&query)
            .bind(term)
            .bind(year_term)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err("Failed to query search candidates"))
    }

    async fn list_movies(
        &self,
        category: &MovieCategory,
        limit: Option<i64>,
    ) -> Result<Vec<MovieRow>> {
        let rows = match category {
            MovieCategory::All => {
                let query = format!(
                    "SELECT {MOVIE_COLUMNS} FROM movies m
                     ORDER BY m.release_date DESC, m.id
                     LIMIT $1"
                );
                sqlx::query_as::<_, MovieRow>(&query)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
            MovieCategory::TopRated => {
                let query = format!(
                    "SELECT * FROM (SELECT {MOVIE_COLUMNS} FROM movies m) t
                     WHERE t.rating_count > 0
                     ORDER BY t.rating_average DESC, t.rating_count DESC, t.id
                     LIMIT $1"
                );
                sqlx::query_as::<_, MovieRow>(&query)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
            MovieCategory::Genre(name) => {
                let query = format!(
                    "SELECT {MOVIE_COLUMNS} FROM movies m
                     WHERE EXISTS (
                         SELECT 1 FROM movie_genres mg JOIN genres g ON g.id = mg.genre_id
                          WHERE mg.movie_id = m.id AND strpos(lower(g.name), lower($1)) > 0
                     )
                     ORDER BY m.release_date DESC, m.id
                     LIMIT $2"
                );
                sqlx::query_as::<_, MovieRow>(&query)
                    .bind(name)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
        };

        rows.map_err(storage_err("Failed to list movies"))
    }

    async fn get_movie(&self, movie_id: i64) -> Result<Option<MovieRow>> {
        let query = format!("SELECT {MOVIE_COLUMNS} FROM movies m WHERE m.id = $1");

        sqlx::query_as::<_, MovieRow>(&query)
            .bind(movie_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err("Failed to get movie"))
    }

    async fn movie_cast(&self, movie_id: i64) -> Result<Vec<CastMember>> {
        let query = "SELECT a.id AS actor_id, a.name, mc.role
                     FROM movie_cast mc
                     JOIN actors a ON a.id = mc.actor_id
                     WHERE mc.movie_id = $1
                     ORDER BY a.name, mc.role";

        sqlx::query_as::<_, CastMember>(query)
            .bind(movie_id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err("Failed to get movie cast"))
    }

    async fn set_movie_genres(&self, movie_id: i64, genres: &[String]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(storage_err("Failed to start transaction"))?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM movies WHERE id = $1")
            .bind(movie_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_err("Failed to look up movie"))?;

        if exists.is_none() {
            return Err(CatalogError::NotFound(format!("movie {}", movie_id)));
        }

        sqlx::query("DELETE FROM movie_genres WHERE movie_id = $1")
            .bind(movie_id)
            .execute(&mut *tx)
            .await
            .map_err(storage_err("Failed to clear movie genres"))?;

        for name in normalize_names(genres) {
            // The no-op update makes RETURNING yield the id of an existing row too
            let genre_id: i32 = sqlx::query_scalar(
                "INSERT INTO genres (name) VALUES ($1)
                 ON CONFLICT ON CONSTRAINT genres_name_key DO UPDATE SET name = EXCLUDED.name
                 RETURNING id",
            )
            .bind(&name)
            .fetch_one(&mut *tx)
            .await
            .map_err(storage_err("Failed to upsert genre"))?;

            sqlx::query(
                "INSERT INTO movie_genres (movie_id, genre_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(movie_id)
            .bind(genre_id)
            .execute(&mut *tx)
            .await
            .map_err(storage_err("Failed to link genre"))?;
        }

        tx.commit()
            .await
            .map_err(storage_err("Failed to commit transaction"))?;

        info!(movie_id, count = genres.len(), "Replaced movie genres");
        Ok(())
    }

    async fn catalog_stats(&self) -> Result<CatalogStats> {
        let query = "SELECT
                        (SELECT COUNT(*) FROM movies) AS total_movies,
                        (SELECT COUNT(*) FROM users) AS total_users,
                        (SELECT COUNT(*) FROM reviews) AS total_reviews,
                        (SELECT COUNT(*) FROM actors) AS total_actors";

        sqlx::query_as::<_, CatalogStats>(query)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err("Failed to compute catalog stats"))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err("Database ping failed"))?;
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for PostgresClient {
    async fn insert_review(&self, review: &NewReview) -> Result<Review> {
        let query = format!(
            "INSERT INTO reviews AS r (movie_id, user_handle, score, comment)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT ON CONSTRAINT reviews_movie_user_key DO NOTHING
             RETURNING {REVIEW_COLUMNS}"
        );

        let inserted = sqlx::query_as::<_, Review>(&query)
            .bind(review.movie_id)
            .bind(&review.user_handle)
            .bind(review.score)
            .bind(&review.comment)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match violated_constraint(&e).as_deref() {
                Some("reviews_movie_id_fkey") => {
                    CatalogError::NotFound(format!("movie {}", review.movie_id))
                }
                Some("reviews_user_handle_fkey") => {
                    CatalogError::NotFound(format!("user {}", review.user_handle))
                }
                _ => CatalogError::Storage(format!("Failed to insert review: {}", e)),
            })?;

        inserted.ok_or_else(|| {
            CatalogError::Conflict(format!(
                "user {} has already reviewed movie {}",
                review.user_handle, review.movie_id
            ))
        })
    }

    async fn update_review(
        &self,
        movie_id: i64,
        user_handle: &str,
        score: i16,
        comment: &str,
    ) -> Result<Option<Review>> {
        let query = format!(
            "UPDATE reviews AS r SET score = $3, comment = $4
             WHERE r.movie_id = $1 AND r.user_handle = $2
             RETURNING {REVIEW_COLUMNS}"
        );

        sqlx::query_as::<_, Review>(&query)
            .bind(movie_id)
            .bind(user_handle)
            .bind(score)
            .bind(comment)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err("Failed to update review"))
    }

    async fn delete_review(&self, movie_id: i64, user_handle: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE movie_id = $1 AND user_handle = $2")
            .bind(movie_id)
            .bind(user_handle)
            .execute(&self.pool)
            .await
            .map_err(storage_err("Failed to delete review"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn movie_reviews(
        &self,
        movie_id: i64,
        sort: ReviewSort,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<MovieReview>, i64)> {
        let order = match sort {
            ReviewSort::Recent => "r.created_at DESC, r.review_id DESC",
            ReviewSort::Rating => "r.score DESC, r.created_at DESC, r.review_id DESC",
            ReviewSort::Oldest => "r.created_at ASC, r.review_id ASC",
        };
        let query = format!(
            "SELECT {REVIEW_COLUMNS}, u.name AS author_name
             FROM reviews r
             JOIN users u ON u.handle = r.user_handle
             WHERE r.movie_id = $1
             ORDER BY {order}
             LIMIT $2 OFFSET $3"
        );

        let reviews = sqlx::query_as::<_, MovieReview>(&query)
            .bind(movie_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err("Failed to list movie reviews"))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE movie_id = $1")
            .bind(movie_id)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err("Failed to count movie reviews"))?;

        Ok((reviews, total))
    }

    async fn user_reviews(
        &self,
        user_handle: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<UserReview>, i64)> {
        let query = format!(
            "SELECT {REVIEW_COLUMNS}, m.title AS movie_title, m.poster_url
             FROM reviews r
             JOIN movies m ON m.id = r.movie_id
             WHERE r.user_handle = $1
             ORDER BY r.created_at DESC, r.review_id DESC
             LIMIT $2 OFFSET $3"
        );

        let reviews = sqlx::query_as::<_, UserReview>(&query)
            .bind(user_handle)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err("Failed to list user reviews"))?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE user_handle = $1")
                .bind(user_handle)
                .fetch_one(&self.pool)
                .await
                .map_err(storage_err("Failed to count user reviews"))?;

        Ok((reviews, total))
    }

    async fn score_counts(&self, movie_id: i64) -> Result<Vec<ScoreCount>> {
        sqlx::query_as::<_, ScoreCount>(
            "SELECT score, COUNT(*) AS count
             FROM reviews
             WHERE movie_id = $1
             GROUP BY score
             ORDER BY score",
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err("Failed to count review scores"))
    }
}

#[async_trait]
impl UserStore for PostgresClient {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (handle, name, email, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING handle, name, email, created_at",
        )
        .bind(&user.handle)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match violated_constraint(&e).as_deref() {
            Some("users_pkey") => CatalogError::Conflict(format!("handle {} is taken", user.handle)),
            Some("users_email_key") => {
                CatalogError::Conflict("e-mail is already registered".to_string())
            }
            _ => CatalogError::Storage(format!("Failed to create user: {}", e)),
        })
    }

    async fn handle_exists(&self, handle: &str) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE handle = $1)")
            .bind(handle)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err("Failed to check handle"))
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE lower(email) = lower($1))")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err("Failed to check e-mail"))
    }

    async fn get_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        sqlx::query_as::<_, UserCredentials>(
            "SELECT handle, name, email, created_at, password_hash
             FROM users
             WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err("Failed to get user"))
    }

    async fn get_credentials(&self, handle: &str) -> Result<Option<UserCredentials>> {
        sqlx::query_as::<_, UserCredentials>(
            "SELECT handle, name, email, created_at, password_hash
             FROM users
             WHERE handle = $1",
        )
        .bind(handle)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err("Failed to get user"))
    }

    async fn get_user(&self, handle: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT handle, name, email, created_at FROM users WHERE handle = $1",
        )
        .bind(handle)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err("Failed to get user"))
    }

    async fn update_user(
        &self,
        handle: &str,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>> {
        if let Some(email) = email {
            let taken: bool = sqlx::query_scalar(
                "SELECT EXISTS (
                     SELECT 1 FROM users WHERE lower(email) = lower($1) AND handle <> $2
                 )",
            )
            .bind(email)
            .bind(handle)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err("Failed to check e-mail"))?;
            if taken {
                return Err(CatalogError::Conflict(
                    "e-mail is already registered".to_string(),
                ));
            }
        }

        sqlx::query_as::<_, User>(
            "UPDATE users
             SET name = COALESCE($2, name), email = COALESCE($3, email)
             WHERE handle = $1
             RETURNING handle, name, email, created_at",
        )
        .bind(handle)
        .bind(name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match violated_constraint(&e).as_deref() {
            Some("users_email_key") => {
                CatalogError::Conflict("e-mail is already registered".to_string())
            }
            _ => CatalogError::Storage(format!("Failed to update user: {}", e)),
        })
    }

    async fn set_password_hash(&self, handle: &str, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE handle = $1")
            .bind(handle)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(storage_err("Failed to update password"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, handle: &str) -> Result<bool> {
        // Reviews go with the user through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM users WHERE handle = $1")
            .bind(handle)
            .execute(&self.pool)
            .await
            .map_err(storage_err("Failed to delete user"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn user_activity(&self) -> Result<UserActivity> {
        sqlx::query_as::<_, UserActivity>(
            "SELECT (SELECT COUNT(*) FROM users) AS total_users,
                    (SELECT COUNT(DISTINCT user_handle) FROM reviews) AS reviewers,
                    (SELECT COUNT(*) FROM reviews) AS total_reviews",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err("Failed to aggregate user activity"))
    }
}

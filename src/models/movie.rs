// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Separator the storage layer uses when it concatenates genre and studio
/// names into a single column.
pub const LIST_SEPARATOR: &str = ", ";

/// Movie row as returned by the storage layer, with genres and studios still
/// concatenated by [`LIST_SEPARATOR`].
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct MovieRow {
    pub id: i64,
    pub title: String,
    pub release_date: NaiveDate,
    pub runtime_minutes: Option<i32>,
    pub synopsis: Option<String>,
    pub poster_url: Option<String>,
    pub genres: Option<String>,
    pub studios: Option<String>,
    pub rating_average: f64,
    pub rating_count: i64,
}

/// Row returned by the title lookup. `exact_match` is the storage-side
/// case-insensitive equality between title and term.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct TitleMatchRow {
    #[sqlx(flatten)]
    pub movie: MovieRow,
    pub exact_match: bool,
}

/// A catalog movie with its genre and studio names split back into lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub release_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    pub genres: Vec<String>,
    pub studios: Vec<String>,
    /// Mean review score, 0 when the movie has no reviews
    pub rating_average: f64,
    pub rating_count: i64,
}

impl Movie {
    pub fn release_year(&self) -> i32 {
        self.release_date.year()
    }
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            release_date: row.release_date,
            runtime_minutes: row.runtime_minutes,
            synopsis: row.synopsis,
            poster_url: row.poster_url,
            genres: split_list(row.genres.as_deref()),
            studios: split_list(row.studios.as_deref()),
            rating_average: row.rating_average,
            rating_count: row.rating_count,
        }
    }
}

/// Split a storage-concatenated name list. Missing or blank columns yield an
/// empty list.
pub fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(LIST_SEPARATOR)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Join names the way the storage layer does.
pub fn join_list(names: &[String]) -> Option<String> {
    if names.is_empty() {
        None
    } else {
        Some(names.join(LIST_SEPARATOR))
    }
}

/// Trim names, drop blanks and drop case-insensitive duplicates, keeping the
/// first spelling seen.
pub fn normalize_names(names: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// A genre with the number of distinct movies carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct GenreSummary {
    pub id: i32,
    pub name: String,
    pub movie_count: i64,
}

impl GenreSummary {
    /// Listing order for genres: lower-cased name, then the name itself so
    /// names differing only in case keep a fixed order.
    pub fn cmp_by_name(&self, other: &Self) -> Ordering {
        self.name
            .to_lowercase()
            .cmp(&other.name.to_lowercase())
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// An actor credited on a movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CastMember {
    pub actor_id: i32,
    pub name: String,
    pub role: String,
}

/// Catalog-wide totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CatalogStats {
    pub total_movies: i64,
    pub total_users: i64,
    pub total_reviews: i64,
    pub total_actors: i64,
}

/// Browsing category for the movie listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieCategory {
    /// Newest releases first
    All,
    /// Best mean rating among reviewed movies
    TopRated,
    /// Movies carrying a genre whose name contains the term
    Genre(String),
}

impl MovieCategory {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "" | "all" => MovieCategory::All,
            "top_rated" | "releases" | "favorites" => MovieCategory::TopRated,
            _ => MovieCategory::Genre(raw.trim().to_string()),
        }
    }

    /// Default page size for the category.
    pub fn default_limit(&self) -> i64 {
        match self {
            MovieCategory::All => 20,
            MovieCategory::TopRated | MovieCategory::Genre(_) => 10,
        }
    }
}

// Echoed back in the listing response.
impl std::fmt::Display for MovieCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovieCategory::All => write!(f, "all"),
            MovieCategory::TopRated => write!(f, "top_rated"),
            MovieCategory::Genre(name) => write!(f, "{}", name),
        }
    }
}

/// Query string for `GET /api/movies`.
#[derive(Debug, Deserialize)]
pub struct MovieListParams {
    pub category: Option<String>,
}

/// Response for the movie listing.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MovieListResponse {
    pub movies: Vec<Movie>,
    pub count: usize,
    pub category: String,
}

/// Response for the cast listing.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CastResponse {
    pub cast: Vec<CastMember>,
    pub count: usize,
}

/// Response for the genre listing.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenreListResponse {
    pub genres: Vec<GenreSummary>,
    pub count: usize,
}

/// Request to replace a movie's genre associations.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SetGenresRequest {
    pub genres: Vec<String>,
}

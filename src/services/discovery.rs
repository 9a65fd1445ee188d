// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Autocomplete, filtered browsing and catalog breakdowns.
//!
//! These work over the full catalog listing and filter in memory.

use crate::error::{CatalogError, Result};
use crate::models::movie::{Movie, MovieCategory};
use crate::models::page::{page_window, Pagination};
use crate::models::review::{MAX_SCORE, MIN_SCORE};
use crate::models::search::{
    AdvancedSearchRequest, AdvancedSearchResponse, BrowseParams, MovieSort, SearchStats,
    Suggestion, SuggestionKind,
};
use crate::services::store::CatalogStore;
use chrono::{Datelike, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;

const MAX_TITLE_SUGGESTIONS: usize = 5;
const MAX_GENRE_SUGGESTIONS: usize = 3;
const MAX_STUDIO_SUGGESTIONS: usize = 3;

/// Earliest year the year browsing route accepts.
pub const MIN_BROWSE_YEAR: i32 = 1900;

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Up to `limit` distinct names containing `term`, in first-seen order.
fn distinct_matches<'a>(
    names: impl Iterator<Item = &'a String>,
    term: &str,
    limit: usize,
) -> Vec<String> {
    let mut seen = BTreeSet::new();
    names
        .filter(|name| contains_ci(name, term))
        .filter(|name| seen.insert(name.to_lowercase()))
        .take(limit)
        .cloned()
        .collect()
}

/// Build autocomplete entries from a catalog listing: titles starting with the
/// term first, then genres and studios containing it.
pub fn suggest(movies: &[Movie], term: &str) -> Vec<Suggestion> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return Vec::new();
    }

    let titles = movies
        .iter()
        .filter(|m| m.title.to_lowercase().starts_with(&term))
        .take(MAX_TITLE_SUGGESTIONS)
        .map(|m| Suggestion {
            kind: SuggestionKind::Title,
            value: m.title.clone(),
            movie_id: Some(m.id),
        });

    let genres = distinct_matches(movies.iter().flat_map(|m| &m.genres), &term, MAX_GENRE_SUGGESTIONS)
        .into_iter()
        .map(|value| Suggestion {
            kind: SuggestionKind::Genre,
            value,
            movie_id: None,
        });

    let studios =
        distinct_matches(movies.iter().flat_map(|m| &m.studios), &term, MAX_STUDIO_SUGGESTIONS)
            .into_iter()
            .map(|value| Suggestion {
                kind: SuggestionKind::Studio,
                value,
                movie_id: None,
            });

    titles.chain(genres).chain(studios).collect()
}

fn validate_filters(request: &AdvancedSearchRequest) -> Result<()> {
    if let (Some(from), Some(to)) = (request.year_from, request.year_to) {
        if from > to {
            return Err(CatalogError::Validation(
                "year_from must not be after year_to".to_string(),
            ));
        }
    }

    let scale = f64::from(MIN_SCORE)..=f64::from(MAX_SCORE);
    for rating in [request.min_rating, request.max_rating].into_iter().flatten() {
        if !scale.contains(&rating) {
            return Err(CatalogError::Validation(format!(
                "rating filters must be between {} and {}",
                MIN_SCORE, MAX_SCORE
            )));
        }
    }

    if let (Some(min), Some(max)) = (request.min_rating, request.max_rating) {
        if min > max {
            return Err(CatalogError::Validation(
                "min_rating must not exceed max_rating".to_string(),
            ));
        }
    }
    Ok(())
}

fn matches_filters(movie: &Movie, request: &AdvancedSearchRequest) -> bool {
    let text = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_lowercase)
    };

    if let Some(query) = text(&request.query) {
        let in_title = contains_ci(&movie.title, &query);
        let in_synopsis = movie
            .synopsis
            .as_deref()
            .is_some_and(|s| contains_ci(s, &query));
        if !in_title && !in_synopsis {
            return false;
        }
    }
    if let Some(genre) = text(&request.genre) {
        if !movie.genres.iter().any(|g| contains_ci(g, &genre)) {
            return false;
        }
    }
    if let Some(studio) = text(&request.studio) {
        if !movie.studios.iter().any(|s| contains_ci(s, &studio)) {
            return false;
        }
    }

    let year = movie.release_year();
    if request.year_from.is_some_and(|from| year < from)
        || request.year_to.is_some_and(|to| year > to)
    {
        return false;
    }

    // Unrated movies never satisfy a rating filter
    let rated = movie.rating_count > 0;
    if request
        .min_rating
        .is_some_and(|min| !rated || movie.rating_average < min)
        || request
            .max_rating
            .is_some_and(|max| !rated || movie.rating_average > max)
    {
        return false;
    }

    true
}

/// Apply the advanced filters, sort and paginate a catalog listing.
pub fn filter_movies(
    movies: Vec<Movie>,
    request: &AdvancedSearchRequest,
) -> Result<AdvancedSearchResponse> {
    validate_filters(request)?;

    let mut matched: Vec<Movie> = movies
        .into_iter()
        .filter(|m| matches_filters(m, request))
        .collect();

    if let Some(sort) = request.sort {
        matched.sort_by(|a, b| sort.compare(a, b));
    }

    let (limit, offset) = page_window(request.limit, request.offset);
    let total = matched.len() as i64;
    let movies = matched
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect();

    Ok(AdvancedSearchResponse {
        movies,
        pagination: Pagination::new(total, limit, offset),
    })
}

/// Parse a year path segment. Accepted years run from [`MIN_BROWSE_YEAR`]
/// through the year after `current_year`.
pub fn parse_browse_year(raw: &str, current_year: i32) -> Result<i32> {
    let invalid = || {
        CatalogError::Validation(format!(
            "invalid year: expected {} to {}",
            MIN_BROWSE_YEAR,
            current_year + 1
        ))
    };
    let year: i32 = raw.trim().parse().map_err(|_| invalid())?;
    if !(MIN_BROWSE_YEAR..=current_year + 1).contains(&year) {
        return Err(invalid());
    }
    Ok(year)
}

fn browse_request(params: &BrowseParams) -> AdvancedSearchRequest {
    AdvancedSearchRequest {
        sort: params.sort.as_deref().and_then(MovieSort::parse),
        limit: params.limit,
        offset: params.offset,
        ..AdvancedSearchRequest::default()
    }
}

/// Count movies per genre, per studio and per decade.
pub fn catalog_breakdown(movies: &[Movie]) -> SearchStats {
    let mut stats = SearchStats {
        total_movies: movies.len(),
        ..SearchStats::default()
    };

    for movie in movies {
        for genre in &movie.genres {
            *stats.genres.entry(genre.clone()).or_insert(0) += 1;
        }
        for studio in &movie.studios {
            *stats.studios.entry(studio.clone()).or_insert(0) += 1;
        }
        let decade = movie.release_year().div_euclid(10) * 10;
        *stats.decades.entry(decade).or_insert(0) += 1;
    }
    stats
}

/// Discovery features backed by the full catalog listing.
pub struct Discovery {
    store: Arc<dyn CatalogStore>,
}

impl Discovery {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    async fn all_movies(&self) -> Result<Vec<Movie>> {
        Ok(self
            .store
            .list_movies(&MovieCategory::All, None)
            .await?
            .into_iter()
            .map(Movie::from)
            .collect())
    }

    pub async fn suggestions(&self, term: &str) -> Result<Vec<Suggestion>> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(suggest(&self.all_movies().await?, term))
    }

    pub async fn advanced_search(
        &self,
        request: &AdvancedSearchRequest,
    ) -> Result<AdvancedSearchResponse> {
        filter_movies(self.all_movies().await?, request)
    }

    /// Movies whose studio list contains `studio`, case-insensitively.
    pub async fn by_studio(
        &self,
        studio: &str,
        params: &BrowseParams,
    ) -> Result<AdvancedSearchResponse> {
        let studio = studio.trim();
        if studio.is_empty() {
            return Err(CatalogError::Validation(
                "studio must not be empty".to_string(),
            ));
        }
        let request = AdvancedSearchRequest {
            studio: Some(studio.to_string()),
            ..browse_request(params)
        };
        filter_movies(self.all_movies().await?, &request)
    }

    /// Movies released in the year named by `raw`.
    pub async fn by_year(&self, raw: &str, params: &BrowseParams) -> Result<AdvancedSearchResponse> {
        let year = parse_browse_year(raw, Utc::now().year())?;
        let request = AdvancedSearchRequest {
            year_from: Some(year),
            year_to: Some(year),
            ..browse_request(params)
        };
        filter_movies(self.all_movies().await?, &request)
    }

    pub async fn stats(&self) -> Result<SearchStats> {
        Ok(catalog_breakdown(&self.all_movies().await?))
    }
}

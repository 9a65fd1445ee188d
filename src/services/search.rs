// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Query classification and relevance ranking.
//!
//! A query is routed to one of three strategies. Genre and title strategies
//! fix the match type; the general strategy scores every candidate with a
//! first-match-wins precedence list:
//!
//! | rule                              | score | match type   |
//! |-----------------------------------|-------|--------------|
//! | title equals query                | 100   | `title`      |
//! | title contains query              | 80    | `title`      |
//! | genre contains query or vice versa| 60    | `genre`      |
//! | studio contains query             | 40    | `production` |
//! | release year contains query       | 30    | `year`       |
//! | otherwise                         | 0     | `other`      |
//!
//! Zero-score candidates are dropped. All strategies sort stably, so equal
//! keys keep storage order, and cap at [`MAX_SEARCH_RESULTS`].

use crate::error::{CatalogError, Result};
use crate::models::movie::{Movie, TitleMatchRow};
use crate::models::page::{page_window, Pagination};
use crate::models::search::{
    MatchType, MovieSort, SearchResponse, SearchResult, SearchType, MAX_SEARCH_RESULTS,
};
use crate::services::genre_catalog::GenreCatalog;
use crate::services::store::CatalogStore;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

pub const TITLE_EXACT_SCORE: u32 = 100;
pub const TITLE_PARTIAL_SCORE: u32 = 80;
pub const GENRE_SCORE: u32 = 60;
pub const PRODUCTION_SCORE: u32 = 40;
pub const YEAR_SCORE: u32 = 30;

/// Case-insensitive containment in either direction.
pub fn contains_either(a: &str, b: &str) -> bool {
    let (a, b) = (a.to_lowercase(), b.to_lowercase());
    a.contains(&b) || b.contains(&a)
}

/// Pick a strategy for a lower-cased, trimmed query.
///
/// The query is genre-directed when it contains a known genre name or a known
/// genre name contains it. Short queries over-match ("ç" hits "ação"); that is
/// accepted behavior.
pub fn classify(query: &str, genre_names: &BTreeSet<String>) -> SearchType {
    let genre_directed = genre_names
        .iter()
        .filter(|name| !name.is_empty())
        .any(|name| name.contains(query) || query.contains(name.as_str()));

    if genre_directed {
        SearchType::Genre
    } else {
        SearchType::General
    }
}

/// Score a movie against a query using the precedence list. The first rule that
/// fires decides; later rules are never evaluated.
pub fn score_movie(query: &str, movie: &Movie) -> (u32, MatchType) {
    let query = query.to_lowercase();
    let title = movie.title.to_lowercase();

    if title == query {
        (TITLE_EXACT_SCORE, MatchType::Title)
    } else if title.contains(&query) {
        (TITLE_PARTIAL_SCORE, MatchType::Title)
    } else if movie.genres.iter().any(|g| contains_either(g, &query)) {
        (GENRE_SCORE, MatchType::Genre)
    } else if movie
        .studios
        .iter()
        .any(|s| s.to_lowercase().contains(&query))
    {
        (PRODUCTION_SCORE, MatchType::Production)
    } else if format!("{:04}", movie.release_year()).contains(&query) {
        (YEAR_SCORE, MatchType::Year)
    } else {
        (0, MatchType::Other)
    }
}

/// Mean rating descending, then release date descending.
fn by_rating_then_date(a: &Movie, b: &Movie) -> Ordering {
    b.rating_average
        .total_cmp(&a.rating_average)
        .then_with(|| b.release_date.cmp(&a.release_date))
}

/// Rank candidates of the general strategy.
pub fn rank_general(query: &str, candidates: Vec<Movie>) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = candidates
        .into_iter()
        .filter_map(|movie| {
            let (score, match_type) = score_movie(query, &movie);
            (score > 0).then_some(SearchResult {
                movie,
                score,
                match_type,
            })
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| by_rating_then_date(&a.movie, &b.movie))
    });
    results.truncate(MAX_SEARCH_RESULTS);
    results
}

/// Rank candidates of the genre strategy. Every result reports [`GENRE_SCORE`].
pub fn rank_genre(query: &str, candidates: Vec<Movie>) -> Vec<SearchResult> {
    let mut movies: Vec<Movie> = candidates
        .into_iter()
        .filter(|movie| movie.genres.iter().any(|g| contains_either(g, query)))
        .collect();

    movies.sort_by(by_rating_then_date);
    movies
        .into_iter()
        .take(MAX_SEARCH_RESULTS)
        .map(|movie| SearchResult {
            movie,
            score: GENRE_SCORE,
            match_type: MatchType::Genre,
        })
        .collect()
}

/// Rank candidates of the title strategy: exact titles first. Exact titles
/// report [`TITLE_EXACT_SCORE`], partial ones [`TITLE_PARTIAL_SCORE`].
pub fn rank_title(query: &str, candidates: Vec<TitleMatchRow>) -> Vec<SearchResult> {
    let query = query.to_lowercase();
    let mut matches: Vec<(bool, Movie)> = candidates
        .into_iter()
        .map(|row| (row.exact_match, Movie::from(row.movie)))
        .filter(|(_, movie)| movie.title.to_lowercase().contains(&query))
        .collect();

    matches.sort_by(|(a_exact, a), (b_exact, b)| {
        b_exact.cmp(a_exact).then_with(|| by_rating_then_date(a, b))
    });
    matches
        .into_iter()
        .take(MAX_SEARCH_RESULTS)
        .map(|(exact, movie)| SearchResult {
            movie,
            score: if exact {
                TITLE_EXACT_SCORE
            } else {
                TITLE_PARTIAL_SCORE
            },
            match_type: MatchType::Title,
        })
        .collect()
}

/// Re-sort ranked results and cut one page out of them.
///
/// Without a sort key the ranking order is kept. `total` and the match type
/// counts still describe the whole ranked set.
pub fn paginate_results(
    mut response: SearchResponse,
    sort: Option<MovieSort>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> SearchResponse {
    if let Some(sort) = sort {
        response
            .results
            .sort_by(|a, b| sort.compare(&a.movie, &b.movie));
    }

    let (limit, offset) = page_window(limit, offset);
    response.results = response
        .results
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect();
    response.pagination = Some(Pagination::new(response.total as i64, limit, offset));
    response
}

/// Classifies queries, retrieves candidates and ranks them.
///
/// Stateless between calls; the only shared state is the genre cache owned by
/// [`GenreCatalog`].
pub struct SearchEngine {
    store: Arc<dyn CatalogStore>,
    genres: Arc<GenreCatalog>,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn CatalogStore>, genres: Arc<GenreCatalog>) -> Self {
        Self { store, genres }
    }

    /// Search the catalog.
    ///
    /// `explicit_type` bypasses classification. Fails with `Validation` on a
    /// blank query and with `Storage` if candidates cannot be retrieved;
    /// results are never partial.
    pub async fn search(
        &self,
        query: &str,
        explicit_type: Option<SearchType>,
    ) -> Result<SearchResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CatalogError::Validation(
                "search query must not be empty".to_string(),
            ));
        }

        let search_type = match explicit_type {
            Some(search_type) => search_type,
            None => {
                let names = self.genres.names_for_detection().await;
                classify(&query.to_lowercase(), &names)
            }
        };

        let results = match search_type {
            SearchType::Genre => {
                let rows = self.store.query_movies_by_genre_substring(query).await?;
                rank_genre(query, rows.into_iter().map(Movie::from).collect())
            }
            SearchType::Title => {
                let rows = self.store.query_movies_by_title_substring(query).await?;
                rank_title(query, rows)
            }
            SearchType::General => {
                let rows = self
                    .store
                    .query_all_candidate_movies_for_general_search(query, query)
                    .await?;
                rank_general(query, rows.into_iter().map(Movie::from).collect())
            }
        };

        debug!(
            query,
            search_type = search_type.as_str(),
            results = results.len(),
            "Search completed"
        );

        Ok(SearchResponse::new(
            query.to_string(),
            search_type,
            results,
        ))
    }
}

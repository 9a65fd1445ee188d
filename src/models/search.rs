// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::movie::Movie;
use crate::models::page::Pagination;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Maximum number of results a single search returns.
pub const MAX_SEARCH_RESULTS: usize = 20;
/// Shortest trimmed query the HTTP layer accepts.
pub const MIN_QUERY_CHARS: usize = 2;

/// Retrieval strategy chosen for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Genre,
    Title,
    General,
}

impl SearchType {
    /// Map an explicit client hint to a strategy. Anything unrecognised falls
    /// back to the general scoring strategy.
    pub fn from_hint(hint: &str) -> Self {
        match hint.trim().to_lowercase().as_str() {
            "genre" => SearchType::Genre,
            "title" => SearchType::Title,
            _ => SearchType::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Genre => "genre",
            SearchType::Title => "title",
            SearchType::General => "general",
        }
    }
}

/// Which precedence rule produced a result's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Title,
    Genre,
    Production,
    Year,
    Other,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Title => "title",
            MatchType::Genre => "genre",
            MatchType::Production => "production",
            MatchType::Year => "year",
            MatchType::Other => "other",
        }
    }
}

/// A movie annotated with its relevance for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchResult {
    #[serde(flatten)]
    pub movie: Movie,
    pub score: u32,
    pub match_type: MatchType,
}

/// Response of `GET /api/search`.
///
/// `total` and `match_type_counts` cover every ranked result. When the client
/// asks for a page, `results` holds only that page and `pagination` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub query: String,
    pub search_type: SearchType,
    pub results: Vec<SearchResult>,
    pub total: usize,
    /// Occurrences of each match type among the ranked results
    pub match_type_counts: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl SearchResponse {
    pub fn new(query: String, search_type: SearchType, results: Vec<SearchResult>) -> Self {
        let mut match_type_counts = BTreeMap::new();
        for result in &results {
            *match_type_counts
                .entry(result.match_type.as_str().to_string())
                .or_insert(0) += 1;
        }

        Self {
            query,
            search_type,
            total: results.len(),
            results,
            match_type_counts,
            pagination: None,
        }
    }
}

/// Query string for `GET /api/search`.
#[derive(Debug, Deserialize, Serialize)]
pub struct SearchParams {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub search_type: Option<String>,
    /// title, year or rating; ranking order when absent
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query string for the studio and year browsing routes.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BrowseParams {
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query string for `GET /api/search/suggestions`.
#[derive(Debug, Deserialize, Serialize)]
pub struct SuggestionParams {
    pub q: Option<String>,
}

/// Kind of autocomplete suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Title,
    Genre,
    Studio,
}

/// A single autocomplete entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub value: String,
    /// Movie id, only for title suggestions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<Suggestion>,
}

/// Sort key shared by search, advanced search and browsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MovieSort {
    /// Alphabetical by title
    Title,
    /// Newest first
    Year,
    /// Highest mean rating first
    Rating,
}

impl MovieSort {
    /// Parse a query-string sort key. Unknown keys yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "title" => Some(MovieSort::Title),
            "year" => Some(MovieSort::Year),
            "rating" => Some(MovieSort::Rating),
            _ => None,
        }
    }

    pub fn compare(&self, a: &Movie, b: &Movie) -> Ordering {
        match self {
            MovieSort::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            MovieSort::Year => b.release_date.cmp(&a.release_date),
            MovieSort::Rating => b
                .rating_average
                .total_cmp(&a.rating_average)
                .then(b.rating_count.cmp(&a.rating_count)),
        }
    }
}

/// Conjunctive filters for `POST /api/search/advanced`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct AdvancedSearchRequest {
    /// Matched against title and synopsis
    pub query: Option<String>,
    pub genre: Option<String>,
    pub studio: Option<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub sort: Option<MovieSort>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A page of movies from advanced search or studio and year browsing.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdvancedSearchResponse {
    pub movies: Vec<Movie>,
    pub pagination: Pagination,
}

/// Catalog breakdown for `GET /api/search/stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SearchStats {
    pub total_movies: usize,
    pub genres: BTreeMap<String, usize>,
    pub studios: BTreeMap<String, usize>,
    /// Keyed by the first year of the decade, e.g. 1990
    pub decades: BTreeMap<i32, usize>,
}

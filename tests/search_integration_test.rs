// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use chrono::{Duration, NaiveDate};
use cineboxd::error::CatalogError;
use cineboxd::models::search::{MatchType, SearchType};
use cineboxd::services::clock::ManualClock;
use cineboxd::services::genre_catalog::GenreCatalog;
use cineboxd::services::memory::{InMemoryCatalog, MovieSeed};
use cineboxd::services::search::SearchEngine;
use cineboxd::services::store::CatalogStore;
use std::sync::Arc;

// Integration tests for the search engine against the in-memory store

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Matrix (1999, 4.5) and Matrix Reloaded (2003, 3.0), both from Warner.
async fn matrix_catalog() -> Arc<InMemoryCatalog> {
    let store = Arc::new(InMemoryCatalog::new());

    let matrix = store
        .insert_movie(
            MovieSeed::new("Matrix", date(1999, 3, 31))
                .genre("Ficção Científica")
                .studio("Warner"),
        )
        .await;
    let reloaded = store
        .insert_movie(
            MovieSeed::new("Matrix Reloaded", date(2003, 5, 15))
                .genre("Ação")
                .studio("Warner"),
        )
        .await;

    store.seed_ratings(matrix, &[4, 5]).await;
    store.seed_ratings(reloaded, &[3]).await;
    store
}

fn engine(store: Arc<InMemoryCatalog>) -> SearchEngine {
    let genres = Arc::new(GenreCatalog::new(
        store.clone(),
        std::time::Duration::from_secs(600),
    ));
    SearchEngine::new(store, genres)
}

fn titles(response: &cineboxd::models::search::SearchResponse) -> Vec<&str> {
    response
        .results
        .iter()
        .map(|r| r.movie.title.as_str())
        .collect()
}

#[tokio::test]
async fn test_exact_title_ranks_before_partial() {
    let engine = engine(matrix_catalog().await);

    let response = engine.search("Matrix", None).await.unwrap();

    assert_eq!(response.search_type, SearchType::General);
    assert_eq!(titles(&response), vec!["Matrix", "Matrix Reloaded"]);
    assert_eq!(response.results[0].score, 100);
    assert_eq!(response.results[1].score, 80);
    assert!(response
        .results
        .iter()
        .all(|r| r.match_type == MatchType::Title));
    assert_eq!(response.total, 2);
    assert_eq!(response.match_type_counts.get("title"), Some(&2));
}

#[tokio::test]
async fn test_year_query_matches_release_year() {
    let engine = engine(matrix_catalog().await);

    let response = engine.search("1999", None).await.unwrap();

    assert_eq!(titles(&response), vec!["Matrix"]);
    assert_eq!(response.results[0].score, 30);
    assert_eq!(response.results[0].match_type, MatchType::Year);
}

#[tokio::test]
async fn test_studio_query_ties_broken_by_rating() {
    let engine = engine(matrix_catalog().await);

    let response = engine.search("warner", None).await.unwrap();

    assert_eq!(titles(&response), vec!["Matrix", "Matrix Reloaded"]);
    assert!(response
        .results
        .iter()
        .all(|r| r.score == 40 && r.match_type == MatchType::Production));
    assert_eq!(response.match_type_counts.get("production"), Some(&2));
}

#[tokio::test]
async fn test_genre_name_routes_to_genre_strategy() {
    let store = matrix_catalog().await;
    store
        .insert_movie(MovieSeed::new("O Exorcista", date(1973, 12, 26)).genre("Terror"))
        .await;
    store
        .insert_movie(MovieSeed::new("Terror Nights", date(2010, 1, 1)).genre("Drama"))
        .await;
    let engine = engine(store);

    let response = engine.search("terror", None).await.unwrap();

    assert_eq!(response.search_type, SearchType::Genre);
    assert_eq!(titles(&response), vec!["O Exorcista"]);
    assert!(response
        .results
        .iter()
        .all(|r| r.match_type == MatchType::Genre));
}

#[tokio::test]
async fn test_explicit_title_type_skips_classification() {
    let store = matrix_catalog().await;
    store
        .insert_movie(MovieSeed::new("Ação Total", date(2001, 1, 1)).genre("Drama"))
        .await;
    let engine = engine(store.clone());

    let response = engine
        .search("ação", Some(SearchType::Title))
        .await
        .unwrap();

    assert_eq!(response.search_type, SearchType::Title);
    assert_eq!(titles(&response), vec!["Ação Total"]);
    assert_eq!(response.results[0].match_type, MatchType::Title);
    assert_eq!(store.genre_aggregate_queries(), 0);
}

#[tokio::test]
async fn test_title_strategy_puts_exact_match_first() {
    let store = Arc::new(InMemoryCatalog::new());
    let sequel = store
        .insert_movie(MovieSeed::new("Alien 3", date(1992, 5, 22)))
        .await;
    store
        .insert_movie(MovieSeed::new("Alien", date(1979, 5, 25)))
        .await;
    store.seed_ratings(sequel, &[5]).await;
    let engine = engine(store);

    let response = engine
        .search("alien", Some(SearchType::Title))
        .await
        .unwrap();

    assert_eq!(titles(&response), vec!["Alien", "Alien 3"]);
    assert_eq!(response.results[0].score, 100);
    assert_eq!(response.results[1].score, 80);
}

#[tokio::test]
async fn test_search_is_idempotent() {
    let store = Arc::new(InMemoryCatalog::new());
    for n in 0..8 {
        store
            .insert_movie(MovieSeed::new(format!("Rocky {}", n), date(1980, 1, 1)).studio("MGM"))
            .await;
    }
    let engine = engine(store);

    let first = engine.search("rocky", None).await.unwrap();
    let second = engine.search("rocky", None).await.unwrap();

    assert_eq!(first, second);
    let ids: Vec<i64> = first.results.iter().map(|r| r.movie.id).collect();
    assert_eq!(ids, (1..=8).collect::<Vec<i64>>());
}

#[tokio::test]
async fn test_results_capped_at_twenty() {
    let store = Arc::new(InMemoryCatalog::new());
    for n in 0..30 {
        store
            .insert_movie(MovieSeed::new(format!("Star Film {}", n), date(1990 + n, 1, 1)))
            .await;
    }
    let engine = engine(store);

    let response = engine.search("star", None).await.unwrap();

    assert_eq!(response.results.len(), 20);
    assert_eq!(response.total, 20);
    assert_eq!(response.results[0].movie.title, "Star Film 29");
}

#[tokio::test]
async fn test_blank_query_is_rejected() {
    let engine = engine(matrix_catalog().await);

    let err = engine.search("   ", None).await.unwrap_err();

    assert!(matches!(err, CatalogError::Validation(_)));
}

#[tokio::test]
async fn test_two_character_query() {
    let engine = engine(matrix_catalog().await);

    let response = engine.search("ma", None).await.unwrap();

    assert_eq!(titles(&response), vec!["Matrix", "Matrix Reloaded"]);
}

#[tokio::test]
async fn test_storage_failure_propagates_from_retrieval() {
    let store = matrix_catalog().await;
    let engine = engine(store.clone());
    store.set_unavailable(true);

    let err = engine.search("Matrix", None).await.unwrap_err();

    assert!(err.is_storage());
}

#[tokio::test]
async fn test_classification_uses_fallback_list_when_genres_fail() {
    let store = matrix_catalog().await;
    let genres = Arc::new(GenreCatalog::new(
        store.clone(),
        std::time::Duration::from_secs(600),
    ));
    // Classification falls back, retrieval still fails
    store.set_unavailable(true);
    let names = genres.names_for_detection().await;
    assert!(names.contains("comedy"));

    let engine = SearchEngine::new(store.clone(), genres);
    assert!(engine.search("comedy", None).await.unwrap_err().is_storage());
}

#[tokio::test]
async fn test_genre_cache_reflects_writes_after_invalidate() {
    let store = matrix_catalog().await;
    let clock = Arc::new(ManualClock::default());
    let genres = GenreCatalog::with_clock(
        store.clone(),
        std::time::Duration::from_secs(600),
        clock.clone(),
    );

    let before: Vec<String> = genres
        .list_genres()
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.name)
        .collect();
    assert_eq!(before, vec!["Ação", "Ficção Científica"]);

    store
        .set_movie_genres(1, &["Cyberpunk".to_string()])
        .await
        .unwrap();
    assert!(genres.list_genres().await.unwrap().iter().all(|g| g.name != "Cyberpunk"));

    genres.invalidate();
    let after = genres.list_genres().await.unwrap();
    let cyberpunk = after.iter().find(|g| g.name == "Cyberpunk").unwrap();
    assert_eq!(cyberpunk.movie_count, 1);
    let scifi = after
        .iter()
        .find(|g| g.name == "Ficção Científica")
        .unwrap();
    assert_eq!(scifi.movie_count, 0);
}

#[tokio::test]
async fn test_genre_cache_expires_after_ten_minutes() {
    let store = Arc::new(InMemoryCatalog::new());
    store.add_genre("Drama").await;
    let clock = Arc::new(ManualClock::default());
    let genres = GenreCatalog::with_clock(
        store.clone(),
        std::time::Duration::from_secs(600),
        clock.clone(),
    );

    // t = 0
    assert_eq!(genres.list_genres().await.unwrap().len(), 1);

    // t = 9:59, store changes, cache still served
    clock.advance(Duration::seconds(9 * 60 + 59));
    store.add_genre("Western").await;
    assert_eq!(genres.list_genres().await.unwrap().len(), 1);

    // t = 10:01
    clock.advance(Duration::seconds(2));
    let names: Vec<String> = genres
        .list_genres()
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.name)
        .collect();
    assert_eq!(names, vec!["Drama", "Western"]);
    assert_eq!(store.genre_aggregate_queries(), 2);
}

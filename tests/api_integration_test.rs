// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Datelike, NaiveDate, Utc};
use cineboxd::app::{create_router, AppState, VERSION};
use cineboxd::models::version::VersionResponse;
use cineboxd::services::memory::{InMemoryCatalog, MovieSeed};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

// HTTP-level tests: the full router over the in-memory store

fn date(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 6, 1).unwrap()
}

async fn seeded_store() -> Arc<InMemoryCatalog> {
    let store = Arc::new(InMemoryCatalog::new());
    let matrix = store
        .insert_movie(
            MovieSeed::new("Matrix", date(1999))
                .genre("Ficção Científica")
                .studio("Warner")
                .actor("Keanu Reeves", "Neo")
                .actor("Carrie-Anne Moss", "Trinity")
                .synopsis("A hacker learns the truth about reality")
                .runtime(136),
        )
        .await;
    let reloaded = store
        .insert_movie(
            MovieSeed::new("Matrix Reloaded", date(2003))
                .genre("Ação")
                .studio("Warner"),
        )
        .await;
    store
        .insert_movie(MovieSeed::new("O Exorcista", date(1973)).genre("Terror"))
        .await;
    store.seed_ratings(matrix, &[4, 5]).await;
    store.seed_ratings(reloaded, &[3]).await;
    store
}

fn app(store: Arc<InMemoryCatalog>) -> Router {
    create_router(AppState::new(store, Duration::from_secs(600)))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn register(app: &Router, name: &str, email: &str) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/auth/register",
        json!({"name": name, "email": email, "password": "secret123"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["user"]["handle"].as_str().unwrap().to_string()
}

// ============================================================================
// Service endpoints
// ============================================================================

#[tokio::test]
async fn test_version_endpoint_response() {
    let app = app(seeded_store().await);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/version")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert_eq!(content_type, "application/json");

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let version_response: VersionResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(version_response.service, "cineboxd");
    assert_eq!(version_response.version, VERSION);
    assert_eq!(version_response.version.split('.').count(), 3);
}

#[tokio::test]
async fn test_health_reports_storage_state() {
    let store = seeded_store().await;
    let app = app(store.clone());

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");

    store.set_unavailable(true);
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["database"], "unavailable");
}

#[tokio::test]
async fn test_invalid_route_returns_404() {
    let app = app(seeded_store().await);
    let (status, _) = get(&app, "/invalid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = app(seeded_store().await);
    let (status, body) = get(&app, "/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/search"].is_object());
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_search_endpoint_ranks_results() {
    let app = app(seeded_store().await);

    let (status, body) = get(&app, "/api/search?q=Matrix").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["search_type"], "general");
    assert_eq!(body["total"], 2);
    assert_eq!(body["results"][0]["title"], "Matrix");
    assert_eq!(body["results"][0]["score"], 100);
    assert_eq!(body["results"][0]["match_type"], "title");
    assert_eq!(body["results"][1]["score"], 80);
    assert_eq!(body["match_type_counts"]["title"], 2);
}

#[tokio::test]
async fn test_search_with_explicit_type() {
    let app = app(seeded_store().await);

    let (status, body) = get(&app, "/api/search?q=terror&type=genre").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["search_type"], "genre");
    assert_eq!(body["results"][0]["title"], "O Exorcista");
    assert_eq!(body["results"][0]["match_type"], "genre");
}

#[tokio::test]
async fn test_search_blank_type_hint_still_classifies() {
    let app = app(seeded_store().await);

    let (status, body) = get(&app, "/api/search?q=terror&type=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["search_type"], "genre");
    assert_eq!(body["results"][0]["title"], "O Exorcista");

    let (_, body) = get(&app, "/api/search?q=terror&type=%20%20").await;
    assert_eq!(body["search_type"], "genre");
}

#[tokio::test]
async fn test_search_sort_and_pagination() {
    let app = app(seeded_store().await);

    let (status, body) = get(&app, "/api/search?q=Matrix&sort=year&limit=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["results"][0]["title"], "Matrix Reloaded");
    assert_eq!(body["total"], 2);
    assert_eq!(body["match_type_counts"]["title"], 2);
    assert_eq!(body["pagination"]["limit"], 1);
    assert_eq!(body["pagination"]["has_more"], true);

    let (_, body) = get(&app, "/api/search?q=Matrix&limit=1&offset=1").await;
    assert_eq!(body["results"][0]["title"], "Matrix Reloaded");
    assert_eq!(body["pagination"]["has_more"], false);
}

#[tokio::test]
async fn test_browse_by_studio() {
    let app = app(seeded_store().await);

    let (status, body) = get(&app, "/api/search/studio/WARNER?sort=rating").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 2);
    assert_eq!(body["movies"][0]["title"], "Matrix");
    assert_eq!(body["movies"][1]["title"], "Matrix Reloaded");

    let (_, body) = get(&app, "/api/search/studio/Pixar").await;
    assert!(body["movies"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_browse_by_year() {
    let app = app(seeded_store().await);

    let (status, body) = get(&app, "/api/search/year/1973").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["movies"][0]["title"], "O Exorcista");

    let next_year = Utc::now().year() + 1;
    let (status, body) = get(&app, &format!("/api/search/year/{}", next_year)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["movies"].as_array().unwrap().is_empty());

    let too_late = (next_year + 1).to_string();
    for year in ["1899", "abc", too_late.as_str()] {
        let (status, body) = get(&app, &format!("/api/search/year/{}", year)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "year {}", year);
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn test_search_rejects_short_query() {
    let app = app(seeded_store().await);

    let (status, body) = get(&app, "/api/search?q=%20m%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = get(&app, "/api/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_storage_failure_is_500() {
    let store = seeded_store().await;
    let app = app(store.clone());
    store.set_unavailable(true);

    let (status, body) = get(&app, "/api/search?q=Matrix").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Internal server error");
}

#[tokio::test]
async fn test_suggestions() {
    let app = app(seeded_store().await);

    let (status, body) = get(&app, "/api/search/suggestions?q=mat").await;
    assert_eq!(status, StatusCode::OK);
    let suggestions = body["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 2);
    // Titles follow the catalog listing, newest first
    assert_eq!(suggestions[0]["kind"], "title");
    assert_eq!(suggestions[0]["value"], "Matrix Reloaded");
    assert_eq!(suggestions[1]["value"], "Matrix");

    let (_, body) = get(&app, "/api/search/suggestions?q=").await;
    assert!(body["suggestions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_advanced_search() {
    let app = app(seeded_store().await);

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/search/advanced",
        json!({"studio": "warner", "sort": "year", "limit": 1}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["movies"][0]["title"], "Matrix Reloaded");
    assert_eq!(body["pagination"]["total"], 2);
    assert_eq!(body["pagination"]["has_more"], true);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/search/advanced",
        json!({"year_from": 2010, "year_to": 2000}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_stats() {
    let app = app(seeded_store().await);

    let (status, body) = get(&app, "/api/search/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_movies"], 3);
    assert_eq!(body["studios"]["Warner"], 2);
    assert_eq!(body["decades"]["1970"], 1);
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_movie_listing_categories() {
    let app = app(seeded_store().await);

    let (status, body) = get(&app, "/api/movies").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "all");
    assert_eq!(body["count"], 3);
    assert_eq!(body["movies"][0]["title"], "Matrix Reloaded");

    let (_, body) = get(&app, "/api/movies?category=favorites").await;
    assert_eq!(body["category"], "top_rated");
    assert_eq!(body["count"], 2);
    assert_eq!(body["movies"][0]["title"], "Matrix");
    assert_eq!(body["movies"][0]["rating_average"], 4.5);

    let (_, body) = get(&app, "/api/movies?category=terror").await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["movies"][0]["title"], "O Exorcista");
}

#[tokio::test]
async fn test_movie_detail_and_cast() {
    let app = app(seeded_store().await);

    let (status, body) = get(&app, "/api/movies/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Matrix");
    assert_eq!(body["genres"], json!(["Ficção Científica"]));
    assert_eq!(body["studios"], json!(["Warner"]));
    assert_eq!(body["runtime_minutes"], 136);

    let (status, body) = get(&app, "/api/movies/1/cast").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["cast"][0]["name"], "Carrie-Anne Moss");
    assert_eq!(body["cast"][1]["role"], "Neo");

    let (status, _) = get(&app, "/api/movies/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get(&app, "/api/movies/99/cast").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_genre_write_invalidates_cache() {
    let store = seeded_store().await;
    let app = app(store.clone());

    let (_, body) = get(&app, "/api/genres").await;
    assert_eq!(body["count"], 3);

    let (status, body) = send_json(
        &app,
        "PUT",
        "/api/movies/2/genres",
        json!({"genres": ["Ação", "Cyberpunk"]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["genres"], json!(["Ação", "Cyberpunk"]));

    let (_, body) = get(&app, "/api/genres").await;
    assert_eq!(body["count"], 4);
    assert_eq!(body["genres"][1]["name"], "Cyberpunk");
    assert_eq!(store.genre_aggregate_queries(), 2);

    let (status, _) = send_json(
        &app,
        "PUT",
        "/api/movies/42/genres",
        json!({"genres": ["Drama"]}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalog_stats() {
    let app = app(seeded_store().await);

    let (status, body) = get(&app, "/api/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_movies"], 3);
    assert_eq!(body["total_reviews"], 3);
    assert_eq!(body["total_actors"], 2);
}

// ============================================================================
// Accounts and reviews
// ============================================================================

#[tokio::test]
async fn test_register_and_login() {
    let app = app(seeded_store().await);

    let handle = register(&app, "Ana Silva", "ana@example.com").await;
    assert_eq!(handle, "anasilva");

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/auth/login",
        json!({"email": "ana@example.com", "password": "secret123"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["handle"], "anasilva");
    assert!(body["user"].get("password_hash").is_none());

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/auth/login",
        json!({"email": "ana@example.com", "password": "nope"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/auth/register",
        json!({"name": "Ana", "email": "ana@example.com", "password": "secret123"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_validation() {
    let app = app(seeded_store().await);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/auth/register",
        json!({"name": "Ana", "email": "ana@example.com", "password": "123"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_review_lifecycle() {
    let app = app(seeded_store().await);
    let handle = register(&app, "Bia", "bia@example.com").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/movies/3/reviews",
        json!({"user_handle": handle, "score": 5, "comment": "Clássico"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["review"]["score"], 5);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/movies/3/reviews",
        json!({"user_handle": handle, "score": 4}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send_json(
        &app,
        "PUT",
        &format!("/api/movies/3/reviews/{}", handle),
        json!({"score": 3, "comment": "Revisto"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["review"]["comment"], "Revisto");

    let (status, body) = get(&app, "/api/movies/3/reviews").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["reviews"][0]["author_name"], "Bia");

    let (_, body) = get(&app, &format!("/api/users/{}/reviews", handle)).await;
    assert_eq!(body["reviews"][0]["movie_title"], "O Exorcista");

    let (_, body) = get(&app, "/api/movies/3").await;
    assert_eq!(body["rating_average"], 3.0);

    let uri = format!("/api/movies/3/reviews/{}", handle);
    let request = Request::builder()
        .method("DELETE")
        .uri(&uri)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .method("DELETE")
        .uri(&uri)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_review_validation_and_missing_refs() {
    let app = app(seeded_store().await);
    let handle = register(&app, "Caio", "caio@example.com").await;

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/movies/1/reviews",
        json!({"user_handle": handle, "score": 6}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let long_comment = "x".repeat(501);
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/movies/1/reviews",
        json!({"user_handle": handle, "score": 4, "comment": long_comment}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/movies/77/reviews",
        json!({"user_handle": handle, "score": 4}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/movies/1/reviews",
        json!({"user_handle": "ghost", "score": 4}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, "/api/movies/77/reviews").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_review_listing_sort_and_pagination() {
    let app = app(seeded_store().await);

    let (_, body) = get(&app, "/api/movies/1/reviews?sort=rating&limit=1").await;
    assert_eq!(body["reviews"][0]["score"], 5);
    assert_eq!(body["pagination"]["total"], 2);
    assert_eq!(body["pagination"]["limit"], 1);
    assert_eq!(body["pagination"]["has_more"], true);

    let (_, body) = get(&app, "/api/movies/1/reviews?sort=rating&limit=1&offset=1").await;
    assert_eq!(body["reviews"][0]["score"], 4);
    assert_eq!(body["pagination"]["has_more"], false);
}

#[tokio::test]
async fn test_movie_review_stats() {
    let app = app(seeded_store().await);

    let (status, body) = get(&app, "/api/movies/1/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["movie_id"], 1);
    assert_eq!(body["review_count"], 2);
    assert_eq!(body["average_score"], 4.5);
    assert_eq!(body["score_distribution"]["5"], 1);
    assert_eq!(body["score_distribution"]["4"], 1);
    assert_eq!(body["score_distribution"]["1"], 0);

    let (status, _) = get(&app, "/api/movies/99/stats").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Profiles
// ============================================================================

#[tokio::test]
async fn test_profile_read_and_update() {
    let app = app(seeded_store().await);
    let handle = register(&app, "Dani", "dani@example.com").await;

    let (status, body) = get(&app, &format!("/api/users/{}", handle)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "dani@example.com");
    assert!(body["user"].get("password_hash").is_none());

    let (status, body) = send_json(
        &app,
        "PUT",
        &format!("/api/users/{}", handle),
        json!({"name": "Daniela", "email": "daniela@example.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Daniela");
    assert_eq!(body["user"]["handle"], handle);

    let uri = format!("/api/users/{}", handle);
    let (status, _) = send_json(&app, "PUT", &uri, json!({"email": "reviewer1@example.com"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send_json(&app, "PUT", &uri, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send_json(&app, "PUT", &uri, json!({"email": "daniela"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/api/users/ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_change_password() {
    let app = app(seeded_store().await);
    let handle = register(&app, "Edu", "edu@example.com").await;
    let uri = format!("/api/users/{}/password", handle);

    let (status, _) = send_json(
        &app,
        "PUT",
        &uri,
        json!({"current_password": "nope123", "new_password": "outrasenha"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send_json(
        &app,
        "PUT",
        &uri,
        json!({"current_password": "secret123", "new_password": "outrasenha"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/auth/login",
        json!({"email": "edu@example.com", "password": "outrasenha"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(
        &app,
        "PUT",
        "/api/users/ghost/password",
        json!({"current_password": "secret123", "new_password": "outrasenha"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_delete_account() {
    let app = app(seeded_store().await);
    let handle = register(&app, "Fabi", "fabi@example.com").await;
    let uri = format!("/api/users/{}", handle);

    let (status, _) = send_json(
        &app,
        "POST",
        "/api/movies/3/reviews",
        json!({"user_handle": handle, "score": 2}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send_json(&app, "DELETE", &uri, json!({"password": "wrong1"})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(&app, "DELETE", &uri, json!({"password": "secret123"})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = get(&app, "/api/movies/3/reviews").await;
    assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_user_stats() {
    let app = app(seeded_store().await);
    register(&app, "Gabi", "gabi@example.com").await;

    let (status, body) = get(&app, "/api/users/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_users"], 4);
    assert_eq!(body["users_with_reviews"], 3);
    assert_eq!(body["total_reviews"], 3);
    assert_eq!(body["average_reviews_per_user"], 0.75);
}

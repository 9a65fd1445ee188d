// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Application state, catalog and search handlers, and router construction.
//!
//! This module is `pub` so that integration tests can build a test router directly
//! without starting the full binary.

use crate::error::{CatalogError, Result};
use crate::models::auth::{
    AccountResponse, ChangePasswordRequest, DeleteAccountRequest, LoginRequest, MessageResponse,
    RegisterRequest, UpdateProfileRequest, UserProfile, UserStats,
};
use crate::models::movie::{
    CastMember, CastResponse, CatalogStats, GenreListResponse, GenreSummary, Movie,
    MovieCategory, MovieListParams, MovieListResponse, SetGenresRequest,
};
use crate::models::page::Pagination;
use crate::models::review::{
    CreateReviewRequest, MovieReview, MovieReviewStats, MovieReviewsResponse, Review,
    ReviewResponse, ReviewSort, UpdateReviewRequest, UserReview, UserReviewsResponse,
};
use crate::models::search::{
    AdvancedSearchRequest, AdvancedSearchResponse, BrowseParams, MatchType, MovieSort,
    SearchParams, SearchResponse, SearchResult, SearchStats, SearchType, Suggestion,
    SuggestionKind, SuggestionParams, SuggestionsResponse, MIN_QUERY_CHARS,
};
use crate::models::version::{HealthResponse, VersionResponse};
use crate::routes::{auth_router, reviews_router, users_router};
use crate::services::auth::AccountService;
use crate::services::discovery::Discovery;
use crate::services::genre_catalog::GenreCatalog;
use crate::services::reviews::ReviewService;
use crate::services::search::{paginate_results, SearchEngine};
use crate::services::store::{CatalogStore, ReviewStore, UserStore};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application version extracted from `Cargo.toml` at compile time.
/// The patch segment can be overridden via `CINEBOXD_PATCH_VERSION` (see `build.rs`).
pub const VERSION: &str = env!("CINEBOXD_VERSION");

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared application state injected into every route handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    /// The single genre cache of the process. Writers that change genre
    /// assignments must invalidate it.
    pub genres: Arc<GenreCatalog>,
    pub search: Arc<SearchEngine>,
    pub discovery: Arc<Discovery>,
    pub reviews: Arc<ReviewService>,
    pub accounts: Arc<AccountService>,
}

impl AppState {
    /// Wire all services over one store with a wall-clock genre cache.
    pub fn new<S>(store: Arc<S>, genre_cache_ttl: Duration) -> Self
    where
        S: CatalogStore + ReviewStore + UserStore + 'static,
    {
        let genres = Arc::new(GenreCatalog::new(store.clone(), genre_cache_ttl));
        Self::with_genre_catalog(store, genres)
    }

    /// Wire all services over one store and an existing genre catalog.
    pub fn with_genre_catalog<S>(store: Arc<S>, genres: Arc<GenreCatalog>) -> Self
    where
        S: CatalogStore + ReviewStore + UserStore + 'static,
    {
        let catalog: Arc<dyn CatalogStore> = store.clone();
        Self {
            search: Arc::new(SearchEngine::new(catalog.clone(), genres.clone())),
            discovery: Arc::new(Discovery::new(catalog.clone())),
            reviews: Arc::new(ReviewService::new(store.clone(), catalog.clone())),
            accounts: Arc::new(AccountService::new(store)),
            catalog,
            genres,
        }
    }
}

// ---------------------------------------------------------------------------
// Service handlers
// ---------------------------------------------------------------------------

#[utoipa::path(get, path = "/version", tag = "service",
    responses((status = 200, body = VersionResponse)))]
pub async fn version_handler() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: "cineboxd".to_string(),
        version: VERSION.to_string(),
    })
}

#[utoipa::path(get, path = "/health", tag = "service",
    responses(
        (status = 200, body = HealthResponse),
        (status = 503, body = HealthResponse, description = "Database unreachable"),
    ))]
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.catalog.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                database: "ok".to_string(),
            }),
        ),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded".to_string(),
                    database: "unavailable".to_string(),
                }),
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Search handlers
// ---------------------------------------------------------------------------

#[utoipa::path(get, path = "/api/search", tag = "search",
    params(
        ("q" = String, Query, description = "Free-text query, at least 2 characters"),
        ("type" = Option<String>, Query, description = "genre, title or general"),
        ("sort" = Option<String>, Query, description = "title, year or rating"),
        ("limit" = Option<i64>, Query, description = "Page size, default 20"),
        ("offset" = Option<i64>, Query, description = "Results to skip"),
    ),
    responses(
        (status = 200, body = SearchResponse),
        (status = 400, body = MessageResponse),
    ))]
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    let query = params.q.as_deref().unwrap_or_default().trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Err(CatalogError::Validation(format!(
            "query must have at least {} characters",
            MIN_QUERY_CHARS
        )));
    }

    let explicit_type = params
        .search_type
        .as_deref()
        .map(str::trim)
        .filter(|hint| !hint.is_empty())
        .map(SearchType::from_hint);
    let response = state.search.search(query, explicit_type).await?;
    let sort = params.sort.as_deref().and_then(MovieSort::parse);

    Ok(Json(paginate_results(
        response,
        sort,
        params.limit,
        params.offset,
    )))
}

#[utoipa::path(get, path = "/api/search/suggestions", tag = "search",
    params(("q" = Option<String>, Query, description = "Prefix or fragment")),
    responses((status = 200, body = SuggestionsResponse)))]
pub async fn suggestions_handler(
    State(state): State<AppState>,
    Query(params): Query<SuggestionParams>,
) -> Result<Json<SuggestionsResponse>> {
    let suggestions = state
        .discovery
        .suggestions(params.q.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(SuggestionsResponse { suggestions }))
}

#[utoipa::path(post, path = "/api/search/advanced", tag = "search",
    request_body = AdvancedSearchRequest,
    responses(
        (status = 200, body = AdvancedSearchResponse),
        (status = 400, body = MessageResponse),
    ))]
pub async fn advanced_search_handler(
    State(state): State<AppState>,
    Json(payload): Json<AdvancedSearchRequest>,
) -> Result<Json<AdvancedSearchResponse>> {
    state.discovery.advanced_search(&payload).await.map(Json)
}

#[utoipa::path(get, path = "/api/search/studio/{studio}", tag = "search",
    params(
        ("studio" = String, Path, description = "Studio name fragment"),
        ("sort" = Option<String>, Query, description = "title, year or rating"),
        ("limit" = Option<i64>, Query, description = "Page size, default 20"),
        ("offset" = Option<i64>, Query, description = "Movies to skip"),
    ),
    responses(
        (status = 200, body = AdvancedSearchResponse),
        (status = 400, body = MessageResponse),
    ))]
pub async fn studio_movies_handler(
    State(state): State<AppState>,
    Path(studio): Path<String>,
    Query(params): Query<BrowseParams>,
) -> Result<Json<AdvancedSearchResponse>> {
    state.discovery.by_studio(&studio, &params).await.map(Json)
}

#[utoipa::path(get, path = "/api/search/year/{year}", tag = "search",
    params(
        ("year" = String, Path, description = "Release year, 1900 to next year"),
        ("sort" = Option<String>, Query, description = "title, year or rating"),
        ("limit" = Option<i64>, Query, description = "Page size, default 20"),
        ("offset" = Option<i64>, Query, description = "Movies to skip"),
    ),
    responses(
        (status = 200, body = AdvancedSearchResponse),
        (status = 400, body = MessageResponse, description = "Invalid year"),
    ))]
pub async fn year_movies_handler(
    State(state): State<AppState>,
    Path(year): Path<String>,
    Query(params): Query<BrowseParams>,
) -> Result<Json<AdvancedSearchResponse>> {
    state.discovery.by_year(&year, &params).await.map(Json)
}

#[utoipa::path(get, path = "/api/search/stats", tag = "search",
    responses((status = 200, body = SearchStats)))]
pub async fn search_stats_handler(State(state): State<AppState>) -> Result<Json<SearchStats>> {
    state.discovery.stats().await.map(Json)
}

// ---------------------------------------------------------------------------
// Catalog handlers
// ---------------------------------------------------------------------------

#[utoipa::path(get, path = "/api/movies", tag = "catalog",
    params(("category" = Option<String>, Query,
        description = "all, top_rated (releases, favorites) or a genre name")),
    responses((status = 200, body = MovieListResponse)))]
pub async fn list_movies_handler(
    State(state): State<AppState>,
    Query(params): Query<MovieListParams>,
) -> Result<Json<MovieListResponse>> {
    let category = MovieCategory::parse(params.category.as_deref().unwrap_or_default());
    let movies: Vec<Movie> = state
        .catalog
        .list_movies(&category, Some(category.default_limit()))
        .await?
        .into_iter()
        .map(Movie::from)
        .collect();

    Ok(Json(MovieListResponse {
        count: movies.len(),
        movies,
        category: category.to_string(),
    }))
}

async fn find_movie(state: &AppState, movie_id: i64) -> Result<Movie> {
    state
        .catalog
        .get_movie(movie_id)
        .await?
        .map(Movie::from)
        .ok_or_else(|| CatalogError::NotFound(format!("movie {}", movie_id)))
}

#[utoipa::path(get, path = "/api/movies/{id}", tag = "catalog",
    params(("id" = i64, Path, description = "Movie id")),
    responses(
        (status = 200, body = Movie),
        (status = 404, body = MessageResponse),
    ))]
pub async fn get_movie_handler(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> Result<Json<Movie>> {
    find_movie(&state, movie_id).await.map(Json)
}

#[utoipa::path(get, path = "/api/movies/{id}/cast", tag = "catalog",
    params(("id" = i64, Path, description = "Movie id")),
    responses(
        (status = 200, body = CastResponse),
        (status = 404, body = MessageResponse),
    ))]
pub async fn movie_cast_handler(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> Result<Json<CastResponse>> {
    find_movie(&state, movie_id).await?;
    let cast = state.catalog.movie_cast(movie_id).await?;
    Ok(Json(CastResponse {
        count: cast.len(),
        cast,
    }))
}

#[utoipa::path(put, path = "/api/movies/{id}/genres", tag = "catalog",
    params(("id" = i64, Path, description = "Movie id")),
    request_body = SetGenresRequest,
    responses(
        (status = 200, body = Movie),
        (status = 404, body = MessageResponse),
    ))]
pub async fn set_movie_genres_handler(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
    Json(payload): Json<SetGenresRequest>,
) -> Result<Json<Movie>> {
    state
        .catalog
        .set_movie_genres(movie_id, &payload.genres)
        .await?;
    state.genres.invalidate();
    info!(movie_id, "Movie genres updated");

    find_movie(&state, movie_id).await.map(Json)
}

#[utoipa::path(get, path = "/api/genres", tag = "catalog",
    responses((status = 200, body = GenreListResponse)))]
pub async fn list_genres_handler(State(state): State<AppState>) -> Result<Json<GenreListResponse>> {
    let genres = state.genres.list_genres().await?;
    Ok(Json(GenreListResponse {
        count: genres.len(),
        genres,
    }))
}

#[utoipa::path(get, path = "/api/stats", tag = "catalog",
    responses((status = 200, body = CatalogStats)))]
pub async fn catalog_stats_handler(State(state): State<AppState>) -> Result<Json<CatalogStats>> {
    state.catalog.catalog_stats().await.map(Json)
}

// ---------------------------------------------------------------------------
// OpenAPI
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    info(title = "cineboxd", description = "Movie catalog, search and review API"),
    paths(
        version_handler,
        health_handler,
        search_handler,
        suggestions_handler,
        advanced_search_handler,
        studio_movies_handler,
        year_movies_handler,
        search_stats_handler,
        list_movies_handler,
        get_movie_handler,
        movie_cast_handler,
        set_movie_genres_handler,
        list_genres_handler,
        catalog_stats_handler,
        crate::routes::auth::register_handler,
        crate::routes::auth::login_handler,
        crate::routes::reviews::create_review_handler,
        crate::routes::reviews::update_review_handler,
        crate::routes::reviews::delete_review_handler,
        crate::routes::reviews::movie_reviews_handler,
        crate::routes::reviews::movie_stats_handler,
        crate::routes::reviews::user_reviews_handler,
        crate::routes::users::user_stats_handler,
        crate::routes::users::get_profile_handler,
        crate::routes::users::update_profile_handler,
        crate::routes::users::change_password_handler,
        crate::routes::users::delete_account_handler,
    ),
    components(schemas(
        AccountResponse,
        AdvancedSearchRequest,
        AdvancedSearchResponse,
        CastMember,
        CastResponse,
        CatalogStats,
        ChangePasswordRequest,
        CreateReviewRequest,
        DeleteAccountRequest,
        GenreListResponse,
        GenreSummary,
        HealthResponse,
        LoginRequest,
        MatchType,
        MessageResponse,
        Movie,
        MovieListResponse,
        MovieSort,
        MovieReview,
        MovieReviewStats,
        MovieReviewsResponse,
        Pagination,
        RegisterRequest,
        Review,
        ReviewResponse,
        ReviewSort,
        SearchResponse,
        SearchResult,
        SearchStats,
        SearchType,
        SetGenresRequest,
        Suggestion,
        SuggestionKind,
        SuggestionsResponse,
        UpdateProfileRequest,
        UpdateReviewRequest,
        UserProfile,
        UserReview,
        UserReviewsResponse,
        UserStats,
        VersionResponse,
    ))
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// CORS policy for the configured origins. An empty list allows any origin.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(origins))
}

/// Build the Axum application router with request tracing and Swagger UI.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/search", get(search_handler))
        .route("/search/suggestions", get(suggestions_handler))
        .route("/search/advanced", post(advanced_search_handler))
        .route("/search/studio/{studio}", get(studio_movies_handler))
        .route("/search/year/{year}", get(year_movies_handler))
        .route("/search/stats", get(search_stats_handler))
        .route("/movies", get(list_movies_handler))
        .route("/movies/{id}", get(get_movie_handler))
        .route("/movies/{id}/cast", get(movie_cast_handler))
        .route("/movies/{id}/genres", put(set_movie_genres_handler))
        .route("/genres", get(list_genres_handler))
        .route("/stats", get(catalog_stats_handler))
        .merge(reviews_router())
        .merge(users_router())
        .nest("/auth", auth_router());

    Router::new()
        .route("/version", get(version_handler))
        .route("/health", get(health_handler))
        .nest("/api", api)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}

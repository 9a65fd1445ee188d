// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Known genres, cached for a short TTL.
//!
//! The cache is a single immutable [`GenreCacheEntry`] behind an `Arc`, swapped
//! wholesale on refill so readers never observe a half-written entry. Two
//! requests that miss at the same time both read storage and the last writer
//! wins; the content is the same either way.

use crate::error::Result;
use crate::models::movie::GenreSummary;
use crate::services::clock::{Clock, SystemClock};
use crate::services::store::CatalogStore;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

/// Default lifetime of a cached genre listing.
pub const DEFAULT_GENRE_CACHE_TTL: Duration = Duration::from_secs(600);

/// Genre tokens used for query classification while storage is unreachable.
pub const FALLBACK_GENRE_NAMES: &[&str] = &[
    "ação",
    "action",
    "aventura",
    "adventure",
    "comédia",
    "comedy",
    "drama",
    "terror",
    "horror",
    "ficção científica",
    "sci-fi",
    "sci fi",
    "romance",
    "thriller",
    "suspense",
    "documentário",
    "documentary",
    "animação",
    "animation",
    "fantasia",
    "fantasy",
    "crime",
    "mystery",
    "guerra",
    "war",
    "western",
    "musical",
    "biografia",
    "biography",
];

/// Snapshot of the genre listing at `fetched_at`.
#[derive(Debug)]
struct GenreCacheEntry {
    genres: Vec<GenreSummary>,
    /// Lower-cased names, for classification
    names: BTreeSet<String>,
    fetched_at: DateTime<Utc>,
}

pub struct GenreCatalog {
    store: Arc<dyn CatalogStore>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
    entry: RwLock<Option<Arc<GenreCacheEntry>>>,
    /// Bumped by `invalidate`; a refill started under an older generation is
    /// not stored.
    generation: AtomicU64,
}

impl GenreCatalog {
    pub fn new(store: Arc<dyn CatalogStore>, ttl: Duration) -> Self {
        Self::with_clock(store, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn CatalogStore>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            entry: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl.to_std().unwrap_or(Duration::MAX)
    }

    /// Every genre with its movie count, ordered case-insensitively by name
    /// (see [`GenreSummary::cmp_by_name`]).
    ///
    /// Served from the cache while it is valid; otherwise reads storage and
    /// replaces the cache. Storage failures propagate.
    pub async fn list_genres(&self) -> Result<Vec<GenreSummary>> {
        Ok(self.load().await?.genres.clone())
    }

    /// Lower-cased genre names for query classification.
    ///
    /// Falls back to [`FALLBACK_GENRE_NAMES`] when storage fails, so search
    /// keeps routing queries in a degraded mode.
    pub async fn names_for_detection(&self) -> BTreeSet<String> {
        match self.load().await {
            Ok(entry) => entry.names.clone(),
            Err(e) => {
                warn!(
                    error = %e,
                    "Genre listing unavailable, classifying with the built-in genre list"
                );
                FALLBACK_GENRE_NAMES.iter().map(|name| name.to_string()).collect()
            }
        }
    }

    /// True iff an entry exists and is younger than the TTL.
    pub fn is_cache_valid(&self) -> bool {
        self.current()
            .is_some_and(|entry| self.is_fresh(&entry))
    }

    /// Drop the cached listing. The next read goes to storage.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.entry.write().unwrap_or_else(|e| e.into_inner()) = None;
        debug!("Genre cache invalidated");
    }

    fn current(&self) -> Option<Arc<GenreCacheEntry>> {
        self.entry
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn is_fresh(&self, entry: &GenreCacheEntry) -> bool {
        self.clock.now() - entry.fetched_at < self.ttl
    }

    async fn load(&self) -> Result<Arc<GenreCacheEntry>> {
        if let Some(entry) = self.current().filter(|entry| self.is_fresh(entry)) {
            return Ok(entry);
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let mut genres = self.store.query_genre_aggregates().await?;
        genres.sort_by(GenreSummary::cmp_by_name);

        let entry = Arc::new(GenreCacheEntry {
            names: genres.iter().map(|g| g.name.to_lowercase()).collect(),
            genres,
            fetched_at: self.clock.now(),
        });

        if self.generation.load(Ordering::SeqCst) == generation {
            *self.entry.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(&entry));
        }
        debug!(count = entry.genres.len(), "Genre cache refilled");

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clock::ManualClock;
    use crate::services::memory::InMemoryCatalog;

    fn catalog_with_clock(store: Arc<InMemoryCatalog>) -> (GenreCatalog, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let catalog = GenreCatalog::with_clock(store, DEFAULT_GENRE_CACHE_TTL, clock.clone());
        (catalog, clock)
    }

    #[tokio::test]
    async fn test_list_genres_sorted_with_zero_counts() {
        let store = Arc::new(InMemoryCatalog::new());
        store.add_genre("Terror").await;
        store.add_genre("Ação").await;
        store.add_genre("Drama").await;
        let (catalog, _) = catalog_with_clock(store);

        let genres = catalog.list_genres().await.unwrap();
        let names: Vec<&str> = genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Ação", "Drama", "Terror"]);
        assert!(genres.iter().all(|g| g.movie_count == 0));
    }

    #[tokio::test]
    async fn test_list_genres_order_ignores_case() {
        let store = Arc::new(InMemoryCatalog::new());
        store.add_genre("Zumbi").await;
        store.add_genre("ação").await;
        store.add_genre("Musical").await;
        let (catalog, _) = catalog_with_clock(store);

        let genres = catalog.list_genres().await.unwrap();
        let names: Vec<&str> = genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["ação", "Musical", "Zumbi"]);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_storage() {
        let store = Arc::new(InMemoryCatalog::new());
        store.add_genre("Drama").await;
        let (catalog, _) = catalog_with_clock(store.clone());

        assert!(!catalog.is_cache_valid());
        catalog.list_genres().await.unwrap();
        catalog.list_genres().await.unwrap();
        catalog.names_for_detection().await;

        assert!(catalog.is_cache_valid());
        assert_eq!(store.genre_aggregate_queries(), 1);
    }

    #[tokio::test]
    async fn test_cache_expires_after_ttl() {
        let store = Arc::new(InMemoryCatalog::new());
        let (catalog, clock) = catalog_with_clock(store.clone());

        catalog.list_genres().await.unwrap();
        clock.advance(chrono::Duration::seconds(599));
        assert!(catalog.is_cache_valid());
        clock.advance(chrono::Duration::seconds(1));
        assert!(!catalog.is_cache_valid());

        catalog.list_genres().await.unwrap();
        assert_eq!(store.genre_aggregate_queries(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload() {
        let store = Arc::new(InMemoryCatalog::new());
        store.add_genre("Drama").await;
        let (catalog, _) = catalog_with_clock(store.clone());

        assert_eq!(catalog.list_genres().await.unwrap().len(), 1);
        store.add_genre("Western").await;
        assert_eq!(catalog.list_genres().await.unwrap().len(), 1);

        catalog.invalidate();
        assert!(!catalog.is_cache_valid());
        assert_eq!(catalog.list_genres().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_names_are_lowercased() {
        let store = Arc::new(InMemoryCatalog::new());
        store.add_genre("Ficção Científica").await;
        let (catalog, _) = catalog_with_clock(store);

        let names = catalog.names_for_detection().await;
        assert!(names.contains("ficção científica"));
    }

    #[tokio::test]
    async fn test_detection_falls_back_when_storage_fails() {
        let store = Arc::new(InMemoryCatalog::new());
        store.add_genre("Noir").await;
        store.set_unavailable(true);
        let (catalog, _) = catalog_with_clock(store);

        assert!(catalog.list_genres().await.unwrap_err().is_storage());

        let names = catalog.names_for_detection().await;
        assert!(names.contains("terror"));
        assert!(names.contains("sci-fi"));
        assert!(!names.contains("noir"));
        assert!(!catalog.is_cache_valid());
    }
}

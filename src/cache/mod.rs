//! Revalidation cache for post detail pages
//!
//! Each resolved post is kept per slug together with the instant it was
//! fetched. Within the revalidation window requests are served from memory
//! without touching the backend; the first request after the window refetches.
//! A failed refetch keeps serving the stale entry, a refetch that finds no
//! post evicts it. Missing posts are never cached.
//!
//! Refetches are single-flight per slug: concurrent requests for the same
//! missing or stale entry wait for one backend query and reuse its result.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::content::{ContentResult, ContentStore, Post};

/// Default revalidation window
pub const DEFAULT_REVALIDATE: Duration = Duration::from_secs(60);

/// Outcome of resolving a slug
#[derive(Debug, Clone)]
pub enum Resolution {
    Found(Arc<Post>),
    NotFound,
}

impl Resolution {
    pub fn post(&self) -> Option<&Arc<Post>> {
        match self {
            Resolution::Found(post) => Some(post),
            Resolution::NotFound => None,
        }
    }
}

/// A cached post and when it was fetched
#[derive(Debug, Clone)]
struct CacheEntry {
    post: Arc<Post>,
    fetched_at: Instant,
}

enum Lookup {
    Fresh(Arc<Post>),
    Stale(Arc<Post>),
    Missing,
}

/// Per-slug page cache with an age-based revalidation window
#[derive(Debug)]
pub struct PageCache {
    window: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// One lock per slug with a refetch in progress
    fetches: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new(DEFAULT_REVALIDATE)
    }
}

impl PageCache {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: RwLock::new(HashMap::new()),
            fetches: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Resolve `slug`, consulting the backend only when the entry is missing or stale
    pub async fn resolve(&self, store: &dyn ContentStore, slug: &str) -> ContentResult<Resolution> {
        if let Lookup::Fresh(post) = self.lookup(slug).await {
            tracing::debug!("Cache hit: {}", slug);
            return Ok(Resolution::Found(post));
        }

        let lock = self.fetch_lock(slug);
        let result = {
            let _guard = lock.lock().await;
            self.refetch(store, slug).await
        };
        self.release_fetch_lock(slug, lock);
        result
    }

    async fn lookup(&self, slug: &str) -> Lookup {
        match self.entries.read().await.get(slug) {
            Some(entry) if entry.fetched_at.elapsed() < self.window => {
                Lookup::Fresh(entry.post.clone())
            }
            Some(entry) => Lookup::Stale(entry.post.clone()),
            None => Lookup::Missing,
        }
    }

    /// Query the backend for `slug`; callers hold the slug's fetch lock
    async fn refetch(&self, store: &dyn ContentStore, slug: &str) -> ContentResult<Resolution> {
        // Another request may have refreshed the entry while we waited.
        let stale = match self.lookup(slug).await {
            Lookup::Fresh(post) => {
                tracing::debug!("Cache hit after waiting on refetch: {}", slug);
                return Ok(Resolution::Found(post));
            }
            Lookup::Stale(post) => Some(post),
            Lookup::Missing => None,
        };

        match store.fetch_post(slug).await {
            Ok(Some(post)) => {
                let post = Arc::new(post);
                self.insert(slug, post.clone()).await;
                Ok(Resolution::Found(post))
            }
            Ok(None) => {
                if self.entries.write().await.remove(slug).is_some() {
                    tracing::info!("Post {} no longer exists, evicted", slug);
                }
                Ok(Resolution::NotFound)
            }
            Err(e) => match stale {
                Some(post) => {
                    tracing::warn!("Revalidating {} failed, serving stale page: {}", slug, e);
                    Ok(Resolution::Found(post))
                }
                None => Err(e),
            },
        }
    }

    /// Resolve every slug up front; returns how many were cached
    pub async fn prerender(&self, store: &dyn ContentStore, slugs: &[String]) -> usize {
        let mut count = 0;
        for slug in slugs {
            match self.resolve(store, slug).await {
                Ok(Resolution::Found(_)) => count += 1,
                Ok(Resolution::NotFound) => {
                    tracing::warn!("Enumerated path {} did not resolve", slug)
                }
                Err(e) => tracing::warn!("Failed to prerender {}: {}", slug, e),
            }
        }
        count
    }

    fn fetch_lock(&self, slug: &str) -> Arc<Mutex<()>> {
        let mut fetches = self.fetches.lock().unwrap_or_else(|e| e.into_inner());
        fetches.entry(slug.to_string()).or_default().clone()
    }

    /// Drop the slug's lock once no other request holds it
    fn release_fetch_lock(&self, slug: &str, lock: Arc<Mutex<()>>) {
        let mut fetches = self.fetches.lock().unwrap_or_else(|e| e.into_inner());
        // One reference in the map, one here.
        if Arc::strong_count(&lock) <= 2 {
            fetches.remove(slug);
        }
    }

    async fn insert(&self, slug: &str, post: Arc<Post>) {
        self.entries.write().await.insert(
            slug.to_string(),
            CacheEntry {
                post,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Number of cached pages
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_post, MemoryStore};

    #[tokio::test(start_paused = true)]
    async fn test_fetch_within_window_is_cached() {
        let store = MemoryStore::new(vec![sample_post("p1", "hello", "Hello")]);
        let cache = PageCache::default();

        assert!(cache.resolve(&store, "hello").await.unwrap().post().is_some());
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(cache.resolve(&store, "hello").await.unwrap().post().is_some());
        assert_eq!(store.post_queries(), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(cache.resolve(&store, "hello").await.unwrap().post().is_some());
        assert_eq!(store.post_queries(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetch_picks_up_changes() {
        let store = MemoryStore::new(vec![sample_post("p1", "hello", "Old title")]);
        let cache = PageCache::new(Duration::from_secs(60));

        cache.resolve(&store, "hello").await.unwrap();
        store.set_posts(vec![sample_post("p1", "hello", "New title")]);

        let cached = cache.resolve(&store, "hello").await.unwrap();
        assert_eq!(cached.post().unwrap().title, "Old title");

        tokio::time::advance(Duration::from_secs(61)).await;
        let fresh = cache.resolve(&store, "hello").await.unwrap();
        assert_eq!(fresh.post().unwrap().title, "New title");
    }

    #[tokio::test]
    async fn test_unknown_slug_is_not_found_and_not_cached() {
        let store = MemoryStore::new(vec![sample_post("p1", "hello", "Hello")]);
        let cache = PageCache::default();

        assert!(matches!(
            cache.resolve(&store, "missing").await.unwrap(),
            Resolution::NotFound
        ));
        assert!(matches!(
            cache.resolve(&store, "missing").await.unwrap(),
            Resolution::NotFound
        ));
        assert_eq!(store.post_queries(), 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_revalidation_serves_stale() {
        let store = MemoryStore::new(vec![sample_post("p1", "hello", "Hello")]);
        let cache = PageCache::default();
        cache.resolve(&store, "hello").await.unwrap();

        store.set_failing(true);
        tokio::time::advance(Duration::from_secs(61)).await;
        let resolution = cache.resolve(&store, "hello").await.unwrap();
        assert_eq!(resolution.post().unwrap().title, "Hello");

        assert!(cache.resolve(&store, "other").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deleted_post_is_evicted() {
        let store = MemoryStore::new(vec![sample_post("p1", "hello", "Hello")]);
        let cache = PageCache::default();
        cache.resolve(&store, "hello").await.unwrap();

        store.set_posts(Vec::new());
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(matches!(
            cache.resolve(&store, "hello").await.unwrap(),
            Resolution::NotFound
        ));
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_share_one_fetch() {
        let store = MemoryStore::new(vec![sample_post("p1", "hello", "Hello")]);
        store.set_latency(Duration::from_secs(1));
        let cache = PageCache::default();

        let (a, b, c) = tokio::join!(
            cache.resolve(&store, "hello"),
            cache.resolve(&store, "hello"),
            cache.resolve(&store, "hello"),
        );
        for resolution in [a, b, c] {
            assert_eq!(resolution.unwrap().post().unwrap().title, "Hello");
        }
        assert_eq!(store.post_queries(), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        let (a, b) = tokio::join!(cache.resolve(&store, "hello"), cache.resolve(&store, "hello"));
        assert!(a.unwrap().post().is_some() && b.unwrap().post().is_some());
        assert_eq!(store.post_queries(), 2);
        assert!(cache.fetches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prerender() {
        let store = MemoryStore::new(vec![
            sample_post("p1", "one", "One"),
            sample_post("p2", "two", "Two"),
        ]);
        let cache = PageCache::default();
        let slugs = vec!["one".to_string(), "two".to_string(), "gone".to_string()];

        assert_eq!(cache.prerender(&store, &slugs).await, 2);
        assert_eq!(cache.len().await, 2);

        cache.resolve(&store, "one").await.unwrap();
        assert_eq!(store.post_queries(), 3);
    }
}

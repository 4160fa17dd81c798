//! medium-rs: a server-rendered blog front-end over a headless content lake
//!
//! Posts, authors and comments live in a hosted content backend. This crate
//! renders the post listing and post detail pages from it, caches detail
//! pages for a short revalidation window, and runs the reader comment form.

pub mod cache;
pub mod commands;
pub mod comments;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod server;
pub mod templates;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use cache::{PageCache, Resolution};
use comments::{CommentForm, CommentInput, CommentSink, EndpointSink, FormState};
use content::{ContentResult, ContentStore, NewComment, Post, SanityClient};
use generator::Generator;

/// The main blog application, cheap to clone into request handlers
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: Arc<config::SiteConfig>,
    store: Arc<dyn ContentStore>,
    sink: Arc<dyn CommentSink>,
    cache: Arc<PageCache>,
    generator: Arc<Generator>,
}

impl Blog {
    /// Create a blog talking to the configured backend and comment endpoint
    pub fn new(config: config::SiteConfig) -> Result<Self> {
        let store = SanityClient::new(&config.backend)?;
        let sink = EndpointSink::new(
            &config.comment_endpoint(),
            Duration::from_secs(config.backend.timeout_secs),
        )?;
        tracing::debug!("Comments are posted to {}", sink.endpoint());
        Self::with_backend(config, Arc::new(store), Arc::new(sink))
    }

    /// Create a blog over explicit backend implementations
    pub fn with_backend(
        config: config::SiteConfig,
        store: Arc<dyn ContentStore>,
        sink: Arc<dyn CommentSink>,
    ) -> Result<Self> {
        let generator = Generator::new(&config)?;
        let cache = PageCache::new(config.revalidate());

        Ok(Self {
            config: Arc::new(config),
            store,
            sink,
            cache: Arc::new(cache),
            generator: Arc::new(generator),
        })
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    /// All posts, in backend order
    pub async fn list_posts(&self) -> ContentResult<Vec<Post>> {
        self.store.fetch_posts().await
    }

    /// Slugs of every known post
    pub async fn static_paths(&self) -> ContentResult<Vec<String>> {
        let paths = self.store.fetch_paths().await?;
        Ok(paths
            .into_iter()
            .filter_map(|p| {
                if p.slug.current.is_empty() {
                    tracing::warn!("Post {} has no slug and cannot be routed", p.id);
                    None
                } else {
                    Some(p.slug.current)
                }
            })
            .collect())
    }

    /// Resolve a post by slug through the revalidation cache
    pub async fn resolve_post(&self, slug: &str) -> ContentResult<Resolution> {
        self.cache.resolve(self.store.as_ref(), slug).await
    }

    /// Enumerate known paths and cache each of them; returns how many were cached
    pub async fn prerender(&self) -> ContentResult<usize> {
        let slugs = self.static_paths().await?;
        let count = self.cache.prerender(self.store.as_ref(), &slugs).await;
        tracing::info!("Prerendered {} of {} posts", count, slugs.len());
        Ok(count)
    }

    /// Drive `form` through one submission of `input`
    pub async fn submit_comment<'a>(
        &self,
        form: &'a mut CommentForm,
        input: CommentInput,
    ) -> &'a FormState {
        form.submit(input, self.sink.as_ref()).await
    }

    /// Create an unapproved comment in the backend
    pub async fn create_comment(&self, comment: &NewComment) -> ContentResult<()> {
        self.store.create_comment(comment).await
    }
}

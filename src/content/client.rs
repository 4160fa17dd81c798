//! Content backend access
//!
//! The rest of the crate only sees the narrow [`ContentStore`] interface:
//! query-all, path enumeration, query-by-slug and create-comment.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use super::queries;
use super::{NewComment, Post, PostPath};
use crate::config::BackendConfig;

/// Errors talking to the content backend or the comment endpoint
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("backend returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type ContentResult<T> = Result<T, ContentError>;

/// Read/write interface to the content backend
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// All posts with the listing projection, in backend order
    async fn fetch_posts(&self) -> ContentResult<Vec<Post>>;

    /// Identifier and slug of every post
    async fn fetch_paths(&self) -> ContentResult<Vec<PostPath>>;

    /// The post with `slug` and its approved comments, `None` if no post matches
    async fn fetch_post(&self, slug: &str) -> ContentResult<Option<Post>>;

    /// Create an unapproved comment on the post identified by `comment.post_id`
    async fn create_comment(&self, comment: &NewComment) -> ContentResult<()>;
}

/// Envelope of a query response
#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: T,
}

/// HTTP client for a hosted content lake
#[derive(Debug, Clone)]
pub struct SanityClient {
    http: reqwest::Client,
    project_id: String,
    dataset: String,
    api_version: String,
    use_cdn: bool,
    token: Option<String>,
    host_override: Option<String>,
}

impl SanityClient {
    /// Create a client from backend configuration
    pub fn new(config: &BackendConfig) -> ContentResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            project_id: config.project_id.clone(),
            dataset: config.dataset.clone(),
            api_version: config.api_version.trim_start_matches('v').to_string(),
            use_cdn: config.use_cdn,
            token: config.token.clone(),
            host_override: config
                .api_host
                .as_deref()
                .map(|h| h.trim_end_matches('/').to_string())
                .filter(|h| !h.is_empty()),
        })
    }

    fn api_host(&self, cdn: bool) -> String {
        if let Some(host) = &self.host_override {
            return host.clone();
        }
        let host = if cdn { "apicdn" } else { "api" };
        format!("https://{}.{}.sanity.io", self.project_id, host)
    }

    /// URL of the query endpoint
    pub fn query_url(&self) -> String {
        format!(
            "{}/v{}/data/query/{}",
            self.api_host(self.use_cdn),
            self.api_version,
            self.dataset
        )
    }

    /// URL of the mutation endpoint (never served from the CDN)
    pub fn mutate_url(&self) -> String {
        format!(
            "{}/v{}/data/mutate/{}",
            self.api_host(false),
            self.api_version,
            self.dataset
        )
    }

    /// Run a GROQ query with JSON-encoded parameters
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        query: &str,
        params: &[(&str, &str)],
    ) -> ContentResult<T> {
        let pairs = query_pairs(query, params)?;

        let mut request = self.http.get(self.query_url()).query(&pairs);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        tracing::debug!("Querying backend: {}", query.lines().next().unwrap_or(""));
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ContentError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: QueryResponse<T> = serde_json::from_str(&text)?;
        Ok(envelope.result)
    }
}

/// Query-string pairs: the query itself plus `$name` parameters as JSON literals
fn query_pairs(query: &str, params: &[(&str, &str)]) -> ContentResult<Vec<(String, String)>> {
    let mut pairs = vec![("query".to_string(), query.to_string())];
    for (name, value) in params {
        pairs.push((format!("${}", name), serde_json::to_string(value)?));
    }
    Ok(pairs)
}

/// Mutation body creating an unapproved comment document
fn create_comment_mutation(comment: &NewComment) -> serde_json::Value {
    serde_json::json!({
        "mutations": [{
            "create": {
                "_type": "comment",
                "post": {
                    "_type": "reference",
                    "_ref": comment.post_id,
                },
                "name": comment.name,
                "email": comment.email,
                "comment": comment.comment,
                "approved": false,
            }
        }]
    })
}

#[async_trait]
impl ContentStore for SanityClient {
    async fn fetch_posts(&self) -> ContentResult<Vec<Post>> {
        self.fetch(queries::ALL_POSTS, &[]).await
    }

    async fn fetch_paths(&self) -> ContentResult<Vec<PostPath>> {
        self.fetch(queries::POST_PATHS, &[]).await
    }

    async fn fetch_post(&self, slug: &str) -> ContentResult<Option<Post>> {
        self.fetch(queries::POST_BY_SLUG, &[("slug", slug)]).await
    }

    async fn create_comment(&self, comment: &NewComment) -> ContentResult<()> {
        let token = self.token.as_ref().ok_or_else(|| {
            ContentError::Config("a write token is required to create comments".to_string())
        })?;

        let response = self
            .http
            .post(self.mutate_url())
            .bearer_auth(token)
            .json(&create_comment_mutation(comment))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::Http {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        tracing::info!("Created comment on post {}", comment.post_id);
        Ok(())
    }
}

//! Outbound delivery of submitted comments

use async_trait::async_trait;
use std::time::Duration;

use crate::content::{ContentError, ContentResult, NewComment};

/// Where a validated comment payload is sent
#[async_trait]
pub trait CommentSink: Send + Sync {
    /// Deliver `comment` once; no retries
    async fn submit(&self, comment: &NewComment) -> ContentResult<()>;
}

/// Posts the JSON payload `{_id, name, email, comment}` to a fixed endpoint
#[derive(Debug, Clone)]
pub struct EndpointSink {
    http: reqwest::Client,
    endpoint: String,
}

impl EndpointSink {
    pub fn new(endpoint: &str, timeout: Duration) -> ContentResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CommentSink for EndpointSink {
    async fn submit(&self, comment: &NewComment) -> ContentResult<()> {
        let response = self.http.post(&self.endpoint).json(comment).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::Http {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        tracing::debug!("Comment delivered to {}", self.endpoint);
        Ok(())
    }
}

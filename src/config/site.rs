//! Site configuration (_config.yml)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub banner: BannerConfig,
    pub favicon: String,

    // Content backend
    pub backend: BackendConfig,

    // Comment submission
    pub comments: CommentsConfig,

    // HTTP server
    pub server: ServerConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Medium Blog".to_string(),
            description: String::new(),
            banner: BannerConfig::default(),
            favicon: "/favicon.ico".to_string(),
            backend: BackendConfig::default(),
            comments: CommentsConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from `path` when it exists, then apply environment overrides
    pub fn resolve<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            Self::load(path)?
        } else {
            tracing::debug!("No config at {:?}, using defaults", path);
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Override backend identifiers from the environment
    ///
    /// The lookup is injected so tests never touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(project_id) = lookup("SANITY_PROJECT_ID").filter(|v| !v.is_empty()) {
            self.backend.project_id = project_id;
        }
        if let Some(dataset) = lookup("SANITY_DATASET").filter(|v| !v.is_empty()) {
            self.backend.dataset = dataset;
        }
        if let Some(token) = lookup("SANITY_API_TOKEN").filter(|v| !v.is_empty()) {
            self.backend.token = Some(token);
        }
    }

    /// Check that the backend can be addressed at all
    pub fn validate(&self) -> Result<()> {
        if self.backend.project_id.trim().is_empty() {
            bail!("backend.project_id is not set (use _config.yml or SANITY_PROJECT_ID)");
        }
        if self.backend.dataset.trim().is_empty() {
            bail!("backend.dataset must not be empty");
        }
        Ok(())
    }

    /// Where the comment form posts its payload
    pub fn comment_endpoint(&self) -> String {
        if self.comments.endpoint.is_empty() {
            let ip = if self.server.ip == "localhost" {
                "127.0.0.1"
            } else {
                &self.server.ip
            };
            format!("http://{}:{}/api/createComment", ip, self.server.port)
        } else {
            self.comments.endpoint.clone()
        }
    }

    /// Freshness window of a rendered detail page
    pub fn revalidate(&self) -> Duration {
        Duration::from_secs(self.server.revalidate_secs)
    }
}

/// Hero banner shown above the listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BannerConfig {
    pub headline: String,
    pub tagline: String,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            headline: "Medium is a place to write, read, and connect".to_string(),
            tagline: "It's easy and free to post your thinking on any topic and connect with millions of readers.".to_string(),
        }
    }
}

/// Content backend connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    pub use_cdn: bool,
    /// Write token, required only for creating comments
    pub token: Option<String>,
    pub timeout_secs: u64,
    /// Base URL replacing the hosted API and CDN hosts, e.g. a local proxy
    pub api_host: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            dataset: "production".to_string(),
            api_version: "2021-10-21".to_string(),
            use_cdn: true,
            token: None,
            timeout_secs: 10,
            api_host: None,
        }
    }
}

/// Comment submission configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    /// Absolute URL the form payload is posted to; empty means this server's own endpoint
    pub endpoint: String,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
    pub revalidate_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "localhost".to_string(),
            port: 3000,
            revalidate_secs: 60,
        }
    }
}

//! In-memory backend doubles shared by unit tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::comments::CommentSink;
use crate::config::SiteConfig;
use crate::content::{
    Author, Block, Comment, ContentError, ContentResult, ContentStore, ImageRef, NewComment, Post,
    PostPath, Reference, Slug, Span, TextBlock,
};

pub fn test_config() -> SiteConfig {
    let mut config = SiteConfig::default();
    config.backend.project_id = "proj".to_string();
    config
}

fn text_block(style: &str, text: &str) -> Block {
    Block::Text(TextBlock {
        style: style.to_string(),
        children: vec![Span {
            text: text.to_string(),
            marks: Vec::new(),
        }],
        ..Default::default()
    })
}

pub fn sample_post(id: &str, slug: &str, title: &str) -> Post {
    Post {
        id: id.to_string(),
        created_at: None,
        title: title.to_string(),
        description: "A sample post".to_string(),
        body: vec![
            text_block("h1", "Introduction"),
            text_block("normal", "Some words."),
        ],
        main_image: Some(ImageRef::from_asset("image-main1-800x600-jpg")),
        slug: Slug::new(slug),
        author: Some(Author {
            name: "Ada".to_string(),
            image: Some(ImageRef::from_asset("image-ada1-100x100-png")),
        }),
        comments: None,
    }
}

pub fn sample_comment(id: &str, post_id: &str, text: &str, approved: bool) -> Comment {
    Comment {
        id: id.to_string(),
        post: Some(Reference {
            reference: post_id.to_string(),
        }),
        name: format!("reader-{}", id),
        email: format!("{}@example.com", id),
        comment: text.to_string(),
        approved,
    }
}

/// A content store that behaves like the backend's query projections
#[derive(Debug, Default)]
pub struct MemoryStore {
    posts: Mutex<Vec<Post>>,
    comments: Mutex<Vec<Comment>>,
    created: Mutex<Vec<NewComment>>,
    failing: AtomicBool,
    latency: Mutex<Option<Duration>>,
    list_queries: AtomicUsize,
    post_queries: AtomicUsize,
}

impl MemoryStore {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts: Mutex::new(posts),
            ..Default::default()
        }
    }

    pub fn set_posts(&self, posts: Vec<Post>) {
        *self.posts.lock().unwrap() = posts;
    }

    pub fn add_comment(&self, comment: Comment) {
        self.comments.lock().unwrap().push(comment);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every by-slug query by `latency`
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    pub fn list_queries(&self) -> usize {
        self.list_queries.load(Ordering::SeqCst)
    }

    pub fn post_queries(&self) -> usize {
        self.post_queries.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> Vec<NewComment> {
        self.created.lock().unwrap().clone()
    }

    fn check(&self) -> ContentResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ContentError::Http {
                status: 503,
                body: "backend unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn fetch_posts(&self) -> ContentResult<Vec<Post>> {
        self.list_queries.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.posts.lock().unwrap().clone())
    }

    async fn fetch_paths(&self) -> ContentResult<Vec<PostPath>> {
        self.check()?;
        Ok(self
            .posts
            .lock()
            .unwrap()
            .iter()
            .map(|p| PostPath {
                id: p.id.clone(),
                slug: p.slug.clone(),
            })
            .collect())
    }

    async fn fetch_post(&self, slug: &str) -> ContentResult<Option<Post>> {
        self.post_queries.fetch_add(1, Ordering::SeqCst);
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.check()?;
        let post = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.slug() == slug)
            .cloned();

        Ok(post.map(|mut post| {
            let comments = self
                .comments
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.is_visible_on(&post.id))
                .cloned()
                .collect();
            post.comments = Some(comments);
            post
        }))
    }

    async fn create_comment(&self, comment: &NewComment) -> ContentResult<()> {
        self.check()?;
        self.created.lock().unwrap().push(comment.clone());
        Ok(())
    }
}

/// A comment sink that records every payload
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<NewComment>>,
    fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<NewComment> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommentSink for RecordingSink {
    async fn submit(&self, comment: &NewComment) -> ContentResult<()> {
        self.calls.lock().unwrap().push(comment.clone());
        if self.fail {
            return Err(ContentError::Http {
                status: 500,
                body: "rejected".to_string(),
            });
        }
        Ok(())
    }
}

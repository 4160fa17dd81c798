//! Generator module - renders HTML pages using built-in Tera templates

use anyhow::Result;
use tera::Context;

use crate::comments::{CommentForm, FormState};
use crate::config::SiteConfig;
use crate::content::{PortableTextRenderer, Post};
use crate::helpers::{html_escape, post_path, published_at, ImageUrlBuilder};
use crate::templates::{
    BannerData, CommentData, FormData, PostCardData, PostData, SiteData, TemplateRenderer,
};

/// Page generator for the listing, detail and error pages
pub struct Generator {
    renderer: TemplateRenderer,
    body: PortableTextRenderer,
    images: ImageUrlBuilder,
    site: SiteData,
}

impl Generator {
    /// Create a new generator
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let images = ImageUrlBuilder::from_config(&config.backend);

        Ok(Self {
            renderer: TemplateRenderer::new()?,
            body: PortableTextRenderer::new(images.clone()),
            images,
            site: build_site_data(config),
        })
    }

    /// Render the listing page: one card per post, in the order given
    pub fn index_page(&self, posts: &[Post]) -> Result<String> {
        let cards: Vec<PostCardData> = posts.iter().map(|p| self.build_card(p)).collect();

        let mut context = self.base_context();
        context.insert("posts", &cards);
        self.renderer.render("index.html", &context)
    }

    /// Render a post page with the comment form in `form`'s state
    pub fn post_page(&self, post: &Post, form: &CommentForm) -> Result<String> {
        let mut context = self.base_context();
        context.insert("post", &self.build_post_data(post));
        context.insert("form", &build_form_data(post, form));
        self.renderer.render("post.html", &context)
    }

    /// Render the 404 page
    pub fn not_found_page(&self) -> Result<String> {
        self.renderer.render("not_found.html", &self.base_context())
    }

    /// Render the generic error page
    pub fn error_page(&self) -> Result<String> {
        self.renderer.render("error.html", &self.base_context())
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context
    }

    fn build_card(&self, post: &Post) -> PostCardData {
        if post.slug().is_empty() {
            tracing::warn!("Post {} has no slug, its card link is broken", post.id);
        }

        PostCardData {
            title: html_escape(&post.title),
            description: html_escape(&post.description),
            path: html_escape(&post_path(post.slug())),
            main_image: self.images.url(post.main_image.as_ref()),
            author_name: html_escape(post.author_name()),
            author_image: self.images.url(post.author_image()),
        }
    }

    fn build_post_data(&self, post: &Post) -> PostData {
        let comments = post
            .visible_comments()
            .map(|c| CommentData {
                id: html_escape(&c.id),
                name: html_escape(&c.name),
                comment: html_escape(&c.comment),
            })
            .collect();

        PostData {
            id: html_escape(&post.id),
            title: html_escape(&post.title),
            description: html_escape(&post.description),
            main_image: self.images.url(post.main_image.as_ref()),
            author_name: html_escape(post.author_name()),
            author_image: self.images.url(post.author_image()),
            published: published_at(post.created_at.as_ref()),
            body_html: self.body.render(&post.body),
            comments,
        }
    }
}

fn build_site_data(config: &SiteConfig) -> SiteData {
    SiteData {
        title: html_escape(&config.title),
        favicon: html_escape(&config.favicon),
        banner: BannerData {
            headline: html_escape(&config.banner.headline),
            tagline: html_escape(&config.banner.tagline),
        },
    }
}

fn build_form_data(post: &Post, form: &CommentForm) -> FormData {
    let mut data = FormData {
        action: html_escape(&post_path(post.slug())),
        post_id: html_escape(&post.id),
        ..Default::default()
    };

    match form.state() {
        FormState::Editing {
            input,
            errors,
            failure,
        } => {
            data.name = html_escape(&input.name);
            data.email = html_escape(&input.email);
            data.comment = html_escape(&input.comment);
            data.errors = errors.messages().into_iter().map(String::from).collect();
            data.failure = failure.as_deref().map(html_escape);
        }
        // Rendered only if a page is produced mid-flight; keep what was typed
        FormState::Submitting { input } => {
            data.name = html_escape(&input.name);
            data.email = html_escape(&input.email);
            data.comment = html_escape(&input.comment);
        }
        FormState::Acknowledged => data.acknowledged = true,
    }

    data
}

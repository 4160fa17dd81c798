//! Built-in page templates using the Tera template engine
//!
//! All templates are embedded in the binary. Autoescaping is off: every value
//! placed in a context is escaped while building the view data below.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Values are escaped by the view builders; rendered rich text must pass through
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("medium/layout.html")),
            ("index.html", include_str!("medium/index.html")),
            ("post.html", include_str!("medium/post.html")),
            ("not_found.html", include_str!("medium/not_found.html")),
            ("error.html", include_str!("medium/error.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("medium/partials/header.html"),
            ),
            (
                "partials/banner.html",
                include_str!("medium/partials/banner.html"),
            ),
            (
                "partials/comment_form.html",
                include_str!("medium/partials/comment_form.html"),
            ),
            (
                "partials/comments.html",
                include_str!("medium/partials/comments.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub favicon: String,
    pub banner: BannerData,
}

#[derive(Debug, Clone, Serialize)]
pub struct BannerData {
    pub headline: String,
    pub tagline: String,
}

/// One card of the listing grid
#[derive(Debug, Clone, Serialize)]
pub struct PostCardData {
    pub title: String,
    pub description: String,
    pub path: String,
    pub main_image: String,
    pub author_name: String,
    pub author_image: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub id: String,
    pub title: String,
    pub description: String,
    pub main_image: String,
    pub author_name: String,
    pub author_image: String,
    pub published: String,
    pub body_html: String,
    pub comments: Vec<CommentData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentData {
    pub id: String,
    pub name: String,
    pub comment: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FormData {
    pub action: String,
    pub post_id: String,
    pub name: String,
    pub email: String,
    pub comment: String,
    pub errors: Vec<String>,
    pub failure: Option<String>,
    pub acknowledged: bool,
}

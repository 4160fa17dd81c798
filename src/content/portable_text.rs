//! Rich-text (Portable Text) body model and HTML rendering
//!
//! The body is an array of blocks. Text blocks carry a style, an optional
//! list membership, spans with marks, and mark definitions for annotations
//! such as links. Headings 1 and 2, list items and links have dedicated
//! serializers; everything else goes through the default serializer.

use serde::{Deserialize, Deserializer, Serialize};

use super::post::null_as_default;
use super::ImageRef;
use crate::helpers::{html_escape, is_safe_href, text_to_html, ImageUrlBuilder};

/// A top-level body node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum Block {
    #[serde(rename = "block")]
    Text(TextBlock),
    #[serde(rename = "image")]
    Image(ImageRef),
    /// Custom block types this renderer does not know about
    #[serde(other)]
    Unknown,
}

/// A paragraph, heading, quote or list item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default = "default_style", deserialize_with = "null_as_style")]
    pub style: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<Span>,
    #[serde(rename = "markDefs", default, deserialize_with = "null_as_default")]
    pub mark_defs: Vec<MarkDef>,
    #[serde(rename = "listItem", default)]
    pub list_item: Option<ListKind>,
    #[serde(default)]
    pub level: Option<u32>,
}

fn default_style() -> String {
    "normal".to_string()
}

fn null_as_style<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_style))
}

/// A run of text with decorators and annotation keys
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Span {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub marks: Vec<String>,
}

/// An annotation definition referenced from span marks by key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkDef {
    #[serde(rename = "_key", default, deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(rename = "_type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default)]
    pub href: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Bullet,
    Number,
    #[serde(other)]
    Other,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            ListKind::Number => "ol",
            ListKind::Bullet | ListKind::Other => "ul",
        }
    }
}

/// Block-level node kinds, each mapped to one serializer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockNode<'a> {
    H1,
    H2,
    ListItem,
    Default(&'a str),
}

impl<'a> BlockNode<'a> {
    fn classify(block: &'a TextBlock) -> Self {
        if block.list_item.is_some() {
            return BlockNode::ListItem;
        }
        match block.style.as_str() {
            "h1" => BlockNode::H1,
            "h2" => BlockNode::H2,
            style => BlockNode::Default(style),
        }
    }
}

/// Inline mark kinds, each mapped to one serializer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkNode<'a> {
    Link(&'a str),
    Default(&'a str),
}

/// Renders a Portable Text body to HTML
#[derive(Debug, Clone)]
pub struct PortableTextRenderer {
    images: ImageUrlBuilder,
}

impl PortableTextRenderer {
    pub fn new(images: ImageUrlBuilder) -> Self {
        Self { images }
    }

    /// Render a whole body, grouping consecutive list items into lists
    pub fn render(&self, blocks: &[Block]) -> String {
        let mut html = String::new();
        let mut open_list: Option<ListKind> = None;

        for block in blocks {
            let list = match block {
                Block::Text(text) => text.list_item,
                _ => None,
            };
            if open_list != list {
                if let Some(kind) = open_list {
                    html.push_str(&format!("</{}>", kind.tag()));
                }
                if let Some(kind) = list {
                    html.push_str(&format!("<{}>", kind.tag()));
                }
                open_list = list;
            }

            match block {
                Block::Text(text) => html.push_str(&self.render_block(text)),
                Block::Image(image) => html.push_str(&self.render_image(image)),
                Block::Unknown => tracing::debug!("Skipping unknown block type"),
            }
        }

        if let Some(kind) = open_list {
            html.push_str(&format!("</{}>", kind.tag()));
        }
        html
    }

    fn render_block(&self, block: &TextBlock) -> String {
        let children = self.render_spans(block);
        match BlockNode::classify(block) {
            BlockNode::H1 => format!(r#"<h1 class="text-2xl font-bold my-5">{}</h1>"#, children),
            BlockNode::H2 => format!(r#"<h2 class="text-xl font-bold my-5">{}</h2>"#, children),
            BlockNode::ListItem => format!(r#"<li class="ml-4 list-disc">{}</li>"#, children),
            BlockNode::Default(style) => default_block(style, &children),
        }
    }

    fn render_spans(&self, block: &TextBlock) -> String {
        block
            .children
            .iter()
            .map(|span| {
                // The first mark is the outermost element.
                span.marks
                    .iter()
                    .rev()
                    .fold(text_to_html(&span.text), |inner, mark| {
                        render_mark(classify_mark(mark, &block.mark_defs), &inner)
                    })
            })
            .collect()
    }

    fn render_image(&self, image: &ImageRef) -> String {
        let src = self.images.url(Some(image));
        if src.is_empty() {
            return String::new();
        }
        format!(
            r#"<figure><img src="{}" alt="{}"/></figure>"#,
            src,
            html_escape(image.alt.as_deref().unwrap_or(""))
        )
    }
}

fn classify_mark<'a>(mark: &'a str, defs: &'a [MarkDef]) -> MarkNode<'a> {
    match defs.iter().find(|d| d.key == mark) {
        Some(def) if def.kind == "link" => MarkNode::Link(def.href.as_deref().unwrap_or("")),
        Some(def) => MarkNode::Default(def.kind.as_str()),
        None => MarkNode::Default(mark),
    }
}

fn render_mark(node: MarkNode<'_>, children: &str) -> String {
    match node {
        MarkNode::Link(href) if is_safe_href(href) => format!(
            r#"<a href="{}" class="text-blue-500 hover:underline">{}</a>"#,
            html_escape(href),
            children
        ),
        MarkNode::Link(_) => children.to_string(),
        MarkNode::Default(kind) => default_mark(kind, children),
    }
}

/// Fallback serializer for block styles without a dedicated one
fn default_block(style: &str, children: &str) -> String {
    match style {
        "h3" | "h4" | "h5" | "h6" => format!("<{0}>{1}</{0}>", style, children),
        "blockquote" => format!("<blockquote>{}</blockquote>", children),
        _ => format!("<p>{}</p>", children),
    }
}

/// Fallback serializer for decorators and unknown annotations
fn default_mark(kind: &str, children: &str) -> String {
    match kind {
        "strong" => format!("<strong>{}</strong>", children),
        "em" => format!("<em>{}</em>", children),
        "code" => format!("<code>{}</code>", children),
        "underline" => format!(r#"<span style="text-decoration:underline">{}</span>"#, children),
        "strike-through" => format!("<del>{}</del>", children),
        _ => children.to_string(),
    }
}

//! Content module - backend access, post models and rich-text rendering

mod client;
mod portable_text;
mod post;
pub mod queries;

pub use client::{ContentError, ContentResult, ContentStore, SanityClient};
pub use portable_text::{Block, ListKind, MarkDef, PortableTextRenderer, Span, TextBlock};
pub use post::{Author, Comment, ImageRef, NewComment, Post, PostPath, Reference, Slug};

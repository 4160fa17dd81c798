//! Post, author and comment models as projected by the content backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::portable_text::Block;

/// Treat an explicit `null` like a missing key
///
/// GROQ projections return `null` for attributes a document lacks.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// URL-safe routing key of a post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slug {
    #[serde(default, deserialize_with = "null_as_default")]
    pub current: String,
}

impl Slug {
    pub fn new(current: &str) -> Self {
        Self {
            current: current.to_string(),
        }
    }
}

/// Weak reference to another document (`{ "_ref": "..." }`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "_ref", default, deserialize_with = "null_as_default")]
    pub reference: String,
}

/// Opaque pointer into the backend's asset store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(default)]
    pub asset: Option<Reference>,
    #[serde(default)]
    pub alt: Option<String>,
}

impl ImageRef {
    pub fn from_asset(reference: &str) -> Self {
        Self {
            asset: Some(Reference {
                reference: reference.to_string(),
            }),
            alt: None,
        }
    }

    /// The raw asset reference, e.g. `image-abc-800x600-jpg`
    pub fn asset_ref(&self) -> Option<&str> {
        self.asset
            .as_ref()
            .map(|a| a.reference.as_str())
            .filter(|r| !r.is_empty())
    }
}

/// Post author, denormalized into the post at query time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub image: Option<ImageRef>,
}

/// A reader comment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id", default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub post: Option<Reference>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Collected but never rendered
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub approved: bool,
}

impl Comment {
    /// Whether this comment may be shown under the post with id `post_id`
    pub fn is_visible_on(&self, post_id: &str) -> bool {
        self.approved
            && self
                .post
                .as_ref()
                .is_some_and(|p| p.reference == post_id)
    }
}

/// A blog post (article)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "_id", default, deserialize_with = "null_as_default")]
    pub id: String,

    #[serde(rename = "_createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    /// Rich-text body
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: Vec<Block>,

    #[serde(rename = "mainImage", default)]
    pub main_image: Option<ImageRef>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: Slug,

    #[serde(default)]
    pub author: Option<Author>,

    /// Approved comments, only present in the detail projection
    #[serde(default)]
    pub comments: Option<Vec<Comment>>,
}

impl Post {
    pub fn slug(&self) -> &str {
        &self.slug.current
    }

    pub fn author_name(&self) -> &str {
        self.author.as_ref().map(|a| a.name.as_str()).unwrap_or("")
    }

    pub fn author_image(&self) -> Option<&ImageRef> {
        self.author.as_ref().and_then(|a| a.image.as_ref())
    }

    /// Comments in backend order, restricted to approved ones that belong to this post
    pub fn visible_comments(&self) -> impl Iterator<Item = &Comment> {
        self.comments
            .iter()
            .flatten()
            .filter(move |c| c.is_visible_on(&self.id))
    }
}

/// Identifier and slug of a post, as returned by path enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPath {
    #[serde(rename = "_id", default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: Slug,
}

/// Payload of a comment submission: `{_id, name, email, comment}`
///
/// `_id` is the identifier of the post being commented on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    #[serde(rename = "_id", default, deserialize_with = "null_as_default")]
    pub post_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: String,
}

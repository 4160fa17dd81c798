//! GROQ queries issued against the content backend
//!
//! The projections here are the contract with the backend and must stay in
//! sync with the fields the models in `post.rs` read.

/// Every post with the fields needed for a listing card
pub const ALL_POSTS: &str = r#"*[_type == "post"] {
  _id,
  title,
  body,
  mainImage,
  author-> {
    name,
    image
  },
  description,
  slug
}"#;

/// Identifier and slug of every post
pub const POST_PATHS: &str = r#"*[_type == "post"] {
  _id,
  slug {
    current
  }
}"#;

/// A single post by `$slug`, with its approved comments
pub const POST_BY_SLUG: &str = r#"*[_type == "post" && slug.current == $slug][0] {
  _id,
  _createdAt,
  title,
  body,
  mainImage,
  author-> {
    name,
    image
  },
  'comments': *[
    _type == "comment" &&
    post._ref == ^._id &&
    approved == true
  ],
  description,
  slug
}"#;

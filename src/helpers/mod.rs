//! Helper functions for page rendering
//!
//! URL generation, image URL resolution, HTML escaping and date formatting.

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;

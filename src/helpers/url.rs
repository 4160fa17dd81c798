//! URL helper functions

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::BackendConfig;
use crate::content::ImageRef;

/// Base URL of the image CDN
const IMAGE_CDN: &str = "https://cdn.sanity.io/images";

lazy_static! {
    /// `image-<assetId>-<width>x<height>-<format>`
    static ref IMAGE_REF: Regex =
        Regex::new(r"^image-([A-Za-z0-9]+)-(\d+x\d+)-([A-Za-z0-9]+)$").unwrap();
}

/// Route of a post detail page
///
/// # Examples
/// ```ignore
/// post_path("hello-world") // -> "/posts/hello-world"
/// ```
pub fn post_path(slug: &str) -> String {
    format!("/posts/{}", slug)
}

/// Resolves opaque image references into CDN URLs
#[derive(Debug, Clone)]
pub struct ImageUrlBuilder {
    project_id: String,
    dataset: String,
}

impl ImageUrlBuilder {
    pub fn new(project_id: &str, dataset: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            dataset: dataset.to_string(),
        }
    }

    pub fn from_config(backend: &BackendConfig) -> Self {
        Self::new(&backend.project_id, &backend.dataset)
    }

    /// URL for an asset reference like `image-abc123-800x600-jpg`
    pub fn url_for_ref(&self, reference: &str) -> Option<String> {
        let caps = IMAGE_REF.captures(reference)?;
        Some(format!(
            "{}/{}/{}/{}-{}.{}",
            IMAGE_CDN, self.project_id, self.dataset, &caps[1], &caps[2], &caps[3]
        ))
    }

    /// URL for an image field, empty when the reference is missing or malformed
    pub fn url(&self, image: Option<&ImageRef>) -> String {
        let Some(reference) = image.and_then(|i| i.asset_ref()) else {
            return String::new();
        };
        match self.url_for_ref(reference) {
            Some(url) => url,
            None => {
                tracing::debug!("Unrecognized image reference: {}", reference);
                String::new()
            }
        }
    }
}

//! List backend content

use anyhow::Result;

use crate::helpers::post_path;
use crate::Blog;

/// List backend content by type
pub async fn run(blog: &Blog, content_type: &str) -> Result<()> {
    match content_type {
        "post" | "posts" => {
            let posts = blog.list_posts().await?;
            println!("Posts ({}):", posts.len());
            for post in posts {
                println!(
                    "  {} by {} [{}]",
                    post.title,
                    post.author_name(),
                    post_path(post.slug())
                );
            }
        }
        "path" | "paths" => {
            let paths = blog.static_paths().await?;
            println!("Paths ({}):", paths.len());
            for slug in paths {
                println!("  {}", post_path(&slug));
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, path", content_type);
        }
    }

    Ok(())
}

//! HTTP server: listing, post pages, comment form and comment endpoint

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;

use crate::cache::Resolution;
use crate::comments::{CommentForm, CommentInput};
use crate::content::NewComment;
use crate::Blog;

/// Error page markup used when even the template fails
const FALLBACK_ERROR: &str = "<h1>500</h1><p>Internal Server Error.</p>";

/// A failed request, rendered as the generic error page
pub struct ErrorPage {
    error: anyhow::Error,
    blog: Blog,
}

impl IntoResponse for ErrorPage {
    fn into_response(self) -> Response {
        tracing::error!("Request failed: {:#}", self.error);
        let body = self
            .blog
            .generator()
            .error_page()
            .unwrap_or_else(|_| FALLBACK_ERROR.to_string());
        (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response()
    }
}

type PageResult = std::result::Result<Response, ErrorPage>;

/// Attach the blog to an error so the error page can be rendered
trait OrErrorPage<T> {
    fn or_error_page(self, blog: &Blog) -> std::result::Result<T, ErrorPage>;
}

impl<T, E> OrErrorPage<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn or_error_page(self, blog: &Blog) -> std::result::Result<T, ErrorPage> {
        self.map_err(|e| ErrorPage {
            error: e.into(),
            blog: blog.clone(),
        })
    }
}

/// Build the application router
pub fn router(blog: Blog) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/posts/:slug", get(post_handler).post(comment_form_handler))
        .route("/api/createComment", post(create_comment_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(blog)
}

/// Prerender known posts and serve until Ctrl+C
pub async fn start(blog: Blog, ip: &str, port: u16) -> Result<()> {
    if let Err(e) = blog.prerender().await {
        tracing::warn!("Path enumeration failed, posts will render on demand: {}", e);
    }

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(blog))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

/// Listing page, fetched fresh on every request
async fn index_handler(State(blog): State<Blog>) -> PageResult {
    let posts = blog.list_posts().await.or_error_page(&blog)?;
    tracing::debug!("Rendering listing with {} posts", posts.len());
    let html = blog.generator().index_page(&posts).or_error_page(&blog)?;
    Ok(Html(html).into_response())
}

/// Post page with an empty comment form
async fn post_handler(State(blog): State<Blog>, Path(slug): Path<String>) -> PageResult {
    let post = match blog.resolve_post(&slug).await.or_error_page(&blog)? {
        Resolution::Found(post) => post,
        Resolution::NotFound => return Ok(not_found(&blog)),
    };

    let form = CommentForm::new(&post.id);
    let html = blog.generator().post_page(&post, &form).or_error_page(&blog)?;
    Ok(Html(html).into_response())
}

/// Comment form submission; re-renders the post page in the resulting form state
async fn comment_form_handler(
    State(blog): State<Blog>,
    Path(slug): Path<String>,
    Form(mut input): Form<CommentInput>,
) -> PageResult {
    let post = match blog.resolve_post(&slug).await.or_error_page(&blog)? {
        Resolution::Found(post) => post,
        Resolution::NotFound => return Ok(not_found(&blog)),
    };

    // The comment always belongs to the page it was posted to.
    input.id = post.id.clone();

    let mut form = CommentForm::new(&post.id);
    blog.submit_comment(&mut form, input).await;

    let html = blog.generator().post_page(&post, &form).or_error_page(&blog)?;
    Ok(Html(html).into_response())
}

/// Create an unapproved comment in the backend
async fn create_comment_handler(
    State(blog): State<Blog>,
    Json(comment): Json<NewComment>,
) -> Response {
    match blog.create_comment(&comment).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "message": "Comment submitted" }))).into_response(),
        Err(e) => {
            tracing::error!("Couldn't submit comment: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Couldn't submit comment", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn fallback_handler(State(blog): State<Blog>) -> Response {
    not_found(&blog)
}

fn not_found(blog: &Blog) -> Response {
    let body = blog
        .generator()
        .not_found_page()
        .unwrap_or_else(|_| "404: This page could not be found".to_string());
    (StatusCode::NOT_FOUND, Html(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::{COMMENT_REQUIRED, EMAIL_REQUIRED, NAME_REQUIRED, SUBMIT_FAILED};
    use crate::testing::{sample_comment, sample_post, test_config, MemoryStore, RecordingSink};
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt as _;

    struct Harness {
        store: Arc<MemoryStore>,
        sink: Arc<RecordingSink>,
        app: Router,
    }

    fn harness_with_sink(sink: RecordingSink) -> Harness {
        let store = Arc::new(MemoryStore::new(vec![
            sample_post("p1", "hello-world", "Hello World"),
            sample_post("p2", "second", "Second"),
        ]));
        let sink = Arc::new(sink);
        let blog = Blog::with_backend(test_config(), store.clone(), sink.clone()).unwrap();
        Harness {
            store,
            sink,
            app: router(blog),
        }
    }

    fn harness() -> Harness {
        harness_with_sink(RecordingSink::default())
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn form_req(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_index_lists_every_post() {
        let h = harness();
        let (status, body) = send(&h.app, get_req("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"href="/posts/hello-world""#));
        assert!(body.contains(r#"href="/posts/second""#));

        send(&h.app, get_req("/")).await;
        assert_eq!(h.store.list_queries(), 2);
    }

    #[tokio::test]
    async fn test_index_backend_failure_is_error_page() {
        let h = harness();
        h.store.set_failing(true);
        let (status, body) = send(&h.app, get_req("/")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("Internal Server Error"));
    }

    #[tokio::test]
    async fn test_post_page() {
        let h = harness();
        h.store.add_comment(sample_comment("c1", "p1", "First!", true));
        h.store.add_comment(sample_comment("c2", "p1", "Awaiting review", false));
        h.store.add_comment(sample_comment("c3", "p2", "Wrong post", true));

        let (status, body) = send(&h.app, get_req("/posts/hello-world")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>Hello World</title>"));
        assert!(body.contains("First!"));
        assert!(!body.contains("Awaiting review"));
        assert!(!body.contains("Wrong post"));
        assert!(body.contains(r#"id="comment-form""#));
    }

    #[tokio::test]
    async fn test_unknown_slug_is_not_found() {
        let h = harness();
        let (status, body) = send(&h.app, get_req("/posts/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("This page could not be found."));
        assert!(!body.contains("Internal Server Error"));
    }

    #[tokio::test]
    async fn test_detail_backend_failure_is_error_page() {
        let h = harness();
        h.store.set_failing(true);
        let (status, _) = send(&h.app, get_req("/posts/hello-world")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let h = harness();
        let (status, _) = send(&h.app, get_req("/about")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn test_detail_page_revalidation_window() {
        let h = harness();
        send(&h.app, get_req("/posts/hello-world")).await;
        tokio::time::advance(Duration::from_secs(59)).await;
        send(&h.app, get_req("/posts/hello-world")).await;
        assert_eq!(h.store.post_queries(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        send(&h.app, get_req("/posts/hello-world")).await;
        assert_eq!(h.store.post_queries(), 2);
    }

    #[tokio::test]
    async fn test_missing_field_blocks_submission() {
        let cases = [
            ("_id=p1&name=&email=a%40b.c&comment=hi", NAME_REQUIRED),
            ("_id=p1&name=Ada&email=&comment=hi", EMAIL_REQUIRED),
            ("_id=p1&name=Ada&email=a%40b.c&comment=", COMMENT_REQUIRED),
        ];
        let all = [NAME_REQUIRED, EMAIL_REQUIRED, COMMENT_REQUIRED];

        for (form, expected) in cases {
            let h = harness();
            let (status, body) = send(&h.app, form_req("/posts/hello-world", form)).await;
            assert_eq!(status, StatusCode::OK);
            assert!(h.sink.calls().is_empty());
            assert_eq!(body.matches("field-error").count(), 1);
            for message in all {
                assert_eq!(body.contains(message), message == expected, "{}", form);
            }
            assert!(body.contains(r#"id="comment-form""#));
        }
    }

    #[tokio::test]
    async fn test_valid_submission_is_acknowledged() {
        let h = harness();
        let (status, body) = send(
            &h.app,
            form_req(
                "/posts/hello-world",
                "_id=p1&name=Ada&email=ada%40example.com&comment=Nice+post",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let calls = h.sink.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            NewComment {
                post_id: "p1".to_string(),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                comment: "Nice post".to_string(),
            }
        );
        assert!(body.contains("Thank you for submitting your comment!"));
        assert!(!body.contains(r#"id="comment-form""#));
        assert!(!body.contains("Nice post"));
    }

    #[tokio::test]
    async fn test_submission_is_bound_to_page_post() {
        let h = harness();
        for form in [
            "_id=p2&name=Ada&email=a%40b.c&comment=hi",
            "name=Ada&email=a%40b.c&comment=hi",
        ] {
            let (status, _) = send(&h.app, form_req("/posts/hello-world", form)).await;
            assert_eq!(status, StatusCode::OK);
        }

        let calls = h.sink.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.post_id == "p1"));
    }

    #[tokio::test]
    async fn test_failed_submission_keeps_input() {
        let h = harness_with_sink(RecordingSink::failing());
        let (status, body) = send(
            &h.app,
            form_req(
                "/posts/hello-world",
                "_id=p1&name=Ada&email=ada%40example.com&comment=Nice+post",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(h.sink.calls().len(), 1);
        assert!(body.contains(r#"id="comment-form""#));
        assert!(body.contains(r#"value="Ada""#));
        assert!(body.contains(r#"value="ada@example.com""#));
        assert!(body.contains("Nice post</textarea>"));
        assert!(body.contains(SUBMIT_FAILED));
        assert!(!body.contains("Thank you for submitting"));
    }

    #[tokio::test]
    async fn test_submission_to_unknown_post_is_not_found() {
        let h = harness();
        let (status, _) = send(
            &h.app,
            form_req("/posts/nope", "_id=p9&name=Ada&email=a%40b.c&comment=hi"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(h.sink.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_comment_endpoint() {
        let h = harness();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/createComment")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"_id":"p1","name":"Ada","email":"ada@example.com","comment":"Hi"}"#,
            ))
            .unwrap();
        let (status, body) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Comment submitted"));

        let created = h.store.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].post_id, "p1");
    }

    #[tokio::test]
    async fn test_create_comment_endpoint_failure() {
        let h = harness();
        h.store.set_failing(true);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/createComment")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"_id":"p1","name":"A","email":"a@b.c","comment":"x"}"#))
            .unwrap();
        let (status, body) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("Couldn't submit comment"));
    }
}

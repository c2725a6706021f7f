use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod error;
pub mod handlers;
pub mod logging;
pub mod render;
pub mod state;

pub use error::AppError;
pub use state::AppState;

/// Browsing routes, served both at the root and under `/v1`.
fn article_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:yyyy/:mm", get(handlers::list_month))
        .route("/post/:id", get(handlers::get_article))
        .route("/search", get(handlers::search_articles))
        .route("/api/search", get(handlers::search_articles_json))
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::top_page))
        .merge(article_routes())
        .nest("/v1", article_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

pub mod prelude {
    pub use teacup_core::{Article, Result, Error};
    pub use crate::{create_app, serve, AppState};
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDateTime;
    use teacup_core::{Article, Page, SearchWindow, TIMESTAMP_FORMAT};
    use teacup_storage::InMemoryStorage;
    use tower::ServiceExt;

    fn article(id: &str, created_at: &str, author: &str, body: &str) -> Article {
        Article {
            id: id.to_string(),
            title: format!("title {}", id),
            author_name: author.to_string(),
            author_remote_addr: "192.0.2.10".to_string(),
            body: body.to_string(),
            created_at: NaiveDateTime::parse_from_str(created_at, TIMESTAMP_FORMAT).unwrap(),
        }
    }

    fn app() -> Router {
        let mut articles = vec![
            article("1", "2021-03-01 00:00:00", "alice", "hello world"),
            article("2", "2021-03-15 12:00:00", "bob", "hello there"),
            article("3", "2022-06-10 08:00:00", "alice", "goodbye"),
        ];
        for i in 0..30 {
            articles.push(article(&format!("1{:02}", i), "2020-01-01 00:00:00", "carol", "bulk entry"));
        }
        let storage = Arc::new(InMemoryStorage::new(articles));
        create_app(AppState::new(storage, SearchWindow::default()))
    }

    async fn get(uri: &str) -> (StatusCode, String) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_top_page() {
        let (status, body) = get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("トップ"));
        assert!(body.contains(r#"href="/2022/7""#));
    }

    #[tokio::test]
    async fn test_month_listing() {
        let (status, body) = get("/2021/3").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("2021年3月"));
        assert!(body.contains("hello world"));
        assert!(body.contains("hello there"));
        assert!(!body.contains("goodbye"));

        let (status, _) = get("/v1/2022/6").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_month_is_bad_request() {
        let (status, _) = get("/2021/13").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_article_detail() {
        let (status, body) = get("/post/3").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("投稿詳細"));
        assert!(body.contains("2022-06-10(金) 08:00:00"));

        let (status, _) = get("/v1/post/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_with_operators() {
        let (status, body) = get("/search?q=hello+by%3Aalice").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("1件の結果。1から1件目を表示中"));
        assert!(body.contains("hello world"));
        assert!(!body.contains("hello there"));
    }

    #[tokio::test]
    async fn test_search_without_query_shows_top_page() {
        let (status, body) = get("/v1/search").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>トップ</title>"));
    }

    #[tokio::test]
    async fn test_whitespace_query_lists_whole_window() {
        let (status, body) = get("/search?q=+").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("33件の結果。1から25件目を表示中"));
        assert!(!body.contains("<title>トップ</title>"));

        let (_, body) = get("/search?q=").await;
        assert!(body.contains("<title>トップ</title>"));
    }

    #[tokio::test]
    async fn test_search_title_keeps_raw_query() {
        let (status, body) = get("/search?q=by%3Aalice+hello").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>by:alice hello</title>"));
        assert!(!body.contains("<title>hello by:alice</title>"));
    }

    #[tokio::test]
    async fn test_search_pagination_json() {
        let (status, body) = get("/api/search?q=bulk&page=2").await;
        assert_eq!(status, StatusCode::OK);
        let page: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(page["total"], 30);
        assert_eq!(page["page"], 2);
        assert_eq!(page["items"].as_array().unwrap().len(), 5);

        let (_, body) = get("/api/search?q=bulk&page=oops").await;
        let page: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(page["page"], 1);
        assert_eq!(page["items"].as_array().unwrap().len(), 25);
    }

    #[test]
    fn test_page_serializes_items() {
        let page = Page::new(vec![1, 2, 3], 1);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["total"], 3);
    }
}

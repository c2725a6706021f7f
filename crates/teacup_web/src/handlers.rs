use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use teacup_core::{build_filter, parse, Article, ArticleFilter, Error, Page, SortOrder};
use tracing::{debug, info};

use crate::error::AppError;
use crate::render;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    /// Kept as text so a malformed page number falls back to page 1.
    pub page: Option<String>,
}

impl SearchParams {
    /// Only an absent or empty `q` counts as no query; whitespace still
    /// searches and matches every article in the window.
    fn query(&self) -> Option<&str> {
        self.q.as_deref().filter(|q| !q.is_empty())
    }

    fn page(&self) -> usize {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(1)
    }
}

pub async fn top_page(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render::top_page(&state.window))
}

pub async fn list_month(
    State(state): State<Arc<AppState>>,
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Html<String>, AppError> {
    let filter = ArticleFilter::month(year, month)?;
    let articles = state.storage.find(&filter, SortOrder::Oldest).await?;
    debug!("{}-{:02}: {} articles", year, month, articles.len());
    Ok(Html(render::month_page(year, month, &articles)))
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let article = state
        .storage
        .get_by_id(&id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("article {}", id)))?;
    Ok(Html(render::detail_page(&article)))
}

async fn run_search(state: &AppState, query: &str, page: usize) -> Result<Page<Article>, AppError> {
    let parsed = parse(query);
    let filter = build_filter(&parsed, &state.window);
    let results = state.storage.find(&filter, SortOrder::Oldest).await?;
    info!("Search {:?} matched {} articles", parsed.to_string(), results.len());
    Ok(Page::new(results, page))
}

pub async fn search_articles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Response, AppError> {
    let Some(query) = params.query() else {
        return Ok(Html(render::top_page(&state.window)).into_response());
    };
    let page = run_search(&state, query, params.page()).await?;
    Ok(Html(render::search_page(query, &page)).into_response())
}

pub async fn search_articles_json(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Page<Article>>, AppError> {
    let query = params.query().unwrap_or_default();
    let page = run_search(&state, query, params.page()).await?;
    Ok(Json(page))
}

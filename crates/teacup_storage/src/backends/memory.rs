use async_trait::async_trait;
use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;
use teacup_core::{Article, ArticleFilter, ArticleStorage, Result, SortOrder};
use tokio::sync::RwLock;
use tracing::debug;
use crate::StorageBackend;

/// Articles held in memory, fixed at construction.
pub struct InMemoryStorage {
    articles: Arc<RwLock<Vec<Article>>>,
}

impl InMemoryStorage {
    pub fn new(articles: Vec<Article>) -> Self {
        Self {
            articles: Arc::new(RwLock::new(articles)),
        }
    }

    /// Load a JSON array of articles.
    pub async fn from_json_file(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        let articles: Vec<Article> = serde_json::from_str(&raw)?;
        debug!("Loaded {} articles from {}", articles.len(), path.display());
        Ok(Self::new(articles))
    }
}

/// Numeric ids compare as integers, the way SQLite orders `article_id`.
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage fixture should be a JSON array of articles"
    }

    async fn open(location: Option<&Path>) -> Result<Self> {
        match location {
            Some(path) => Self::from_json_file(path).await,
            None => Ok(Self::new(Vec::new())),
        }
    }
}

#[async_trait]
impl ArticleStorage for InMemoryStorage {
    async fn find(&self, filter: &ArticleFilter, order: SortOrder) -> Result<Vec<Article>> {
        let articles = self.articles.read().await;
        let mut found: Vec<Article> = articles
            .iter()
            .filter(|article| filter.matches(article))
            .cloned()
            .collect();

        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| compare_ids(&a.id, &b.id)));
        if order == SortOrder::Newest {
            found.reverse();
        }
        Ok(found)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Article>> {
        let articles = self.articles.read().await;
        Ok(articles.iter().find(|article| article.id == id).cloned())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.articles.read().await.len())
    }
}

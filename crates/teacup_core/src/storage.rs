use async_trait::async_trait;
use crate::filter::ArticleFilter;
use crate::types::{Article, SortOrder};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Return every article matching all predicates of `filter`
    async fn find(&self, filter: &ArticleFilter, order: SortOrder) -> Result<Vec<Article>>;

    /// Look up a single article by its identifier
    async fn get_by_id(&self, id: &str) -> Result<Option<Article>>;

    /// Number of stored articles
    async fn count(&self) -> Result<usize>;
}

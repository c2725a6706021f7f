use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use teacup_core::{
    parse_timestamp, Article, ArticleFilter, ArticleStorage, Comparison, Error, Field, Result, SortOrder,
};
use tracing::{debug, warn};
use crate::StorageBackend;

pub const DEFAULT_DB_PATH: &str = "static/teacup_articles.sqlite";

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        article_id INTEGER PRIMARY KEY,
        article_title TEXT NOT NULL,
        author_name TEXT NOT NULL,
        author_remote_addr TEXT NOT NULL,
        created_at TEXT NOT NULL,
        article_text TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_articles_created_at ON articles (created_at)",
];

const SELECT_ARTICLES: &str = r#"
    SELECT CAST(article_id AS TEXT) AS id_text,
           article_title,
           author_name,
           author_remote_addr,
           strftime('%Y-%m-%d %H:%M:%S', created_at) AS created_stamp,
           CAST(created_at AS TEXT) AS created_raw,
           article_text
    FROM articles
"#;

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be available at ./static/teacup_articles.sqlite"
    }

    async fn open(location: Option<&Path>) -> Result<Self> {
        let db_path = location.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
        Self::new_with_path(&db_path).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }
}

fn column(field: Field) -> &'static str {
    match field {
        Field::Body => "article_text",
        Field::AuthorName => "author_name",
        Field::Title => "article_title",
        Field::CreatedAt => "created_at",
    }
}

/// `%value%` with LIKE wildcards in `value` escaped by `\`.
fn like_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn select_matching(filter: &ArticleFilter, order: SortOrder) -> QueryBuilder<'static, Sqlite> {
    let mut builder = QueryBuilder::new(SELECT_ARTICLES);

    for (i, predicate) in filter.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        builder.push(column(predicate.field));
        match predicate.comparison {
            Comparison::Contains => {
                builder
                    .push(" LIKE ")
                    .push_bind(like_pattern(&predicate.value))
                    .push(" ESCAPE '\\'");
            }
            Comparison::AtLeast => {
                builder.push(" >= ").push_bind(predicate.value.clone());
            }
            Comparison::AtMost => {
                builder.push(" <= ").push_bind(predicate.value.clone());
            }
        }
    }

    builder.push(match order {
        SortOrder::Oldest => " ORDER BY articles.created_at ASC, articles.article_id ASC",
        SortOrder::Newest => " ORDER BY articles.created_at DESC, articles.article_id DESC",
    });
    builder
}

fn optional_text(row: &SqliteRow, name: &str) -> Result<Option<String>> {
    row.try_get::<Option<String>, _>(name)
        .map_err(|e| Error::Database(format!("Failed to read column {}: {}", name, e)))
}

/// Map a row to an [`Article`]. Rows whose `created_at` matches none of the
/// accepted layouts are skipped with a warning and yield `None`.
fn article_from_row(row: &SqliteRow) -> Result<Option<Article>> {
    let get = |name: &str| -> Result<String> {
        optional_text(row, name)?.ok_or_else(|| Error::Database(format!("Column {} is NULL", name)))
    };

    let id = get("id_text")?;
    let stamp = optional_text(row, "created_stamp")?;
    let raw = optional_text(row, "created_raw")?;
    let created_at = stamp
        .as_deref()
        .and_then(parse_timestamp)
        .or_else(|| raw.as_deref().and_then(parse_timestamp));
    let Some(created_at) = created_at else {
        warn!("Skipping article {}: unreadable created_at {:?}", id, raw);
        return Ok(None);
    };

    Ok(Some(Article {
        id,
        title: get("article_title")?,
        author_name: get("author_name")?,
        author_remote_addr: get("author_remote_addr")?,
        body: get("article_text")?,
        created_at,
    }))
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn find(&self, filter: &ArticleFilter, order: SortOrder) -> Result<Vec<Article>> {
        let mut builder = select_matching(filter, order);
        debug!("Running article query: {}", builder.sql());

        let rows = builder
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to search articles: {}", e)))?;

        let mut articles = Vec::with_capacity(rows.len());
        for row in &rows {
            articles.extend(article_from_row(row)?);
        }
        Ok(articles)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Article>> {
        let row = sqlx::query(&format!("{} WHERE article_id = ?", SELECT_ARTICLES))
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to get article {}: {}", id, e)))?;

        Ok(row.as_ref().map(article_from_row).transpose()?.flatten())
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to count articles: {}", e)))?;
        Ok(count as usize)
    }
}

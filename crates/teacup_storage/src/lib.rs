use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use teacup_core::{ArticleStorage, Error, Result};
use tracing::info;

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn get_error_message() -> &'static str;
    async fn open(location: Option<&Path>) -> Result<Self> where Self: Sized;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    Memory,
    #[default]
    Sqlite,
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::Storage(format!(
                "Unknown storage backend: {} (expected memory or sqlite)",
                other
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// Open the requested backend. `location` is the database file for SQLite and
/// an optional JSON fixture for the in-memory store.
pub async fn create_storage(kind: BackendKind, location: Option<&Path>) -> Result<Arc<dyn ArticleStorage>> {
    let storage: Arc<dyn ArticleStorage> = match kind {
        BackendKind::Memory => Arc::new(open_backend::<InMemoryStorage>(location).await?),
        #[cfg(feature = "sqlite")]
        BackendKind::Sqlite => Arc::new(open_backend::<SQLiteStorage>(location).await?),
        #[cfg(not(feature = "sqlite"))]
        BackendKind::Sqlite => {
            return Err(Error::Storage("SQLite support was not compiled in".to_string()));
        }
    };
    info!("Opened {} storage", kind);
    Ok(storage)
}

async fn open_backend<T: StorageBackend>(location: Option<&Path>) -> Result<T> {
    T::open(location).await.map_err(|e| {
        tracing::error!("{}", T::get_error_message());
        e
    })
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, BackendKind, StorageBackend};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!("memory".parse::<BackendKind>().unwrap(), BackendKind::Memory);
        assert_eq!(" SQLite ".parse::<BackendKind>().unwrap(), BackendKind::Sqlite);
        assert!("postgres".parse::<BackendKind>().is_err());
    }

    #[tokio::test]
    async fn test_create_empty_memory_storage() {
        let storage = create_storage(BackendKind::Memory, None).await.unwrap();
        assert_eq!(storage.count().await.unwrap(), 0);
    }
}

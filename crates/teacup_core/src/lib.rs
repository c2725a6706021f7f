pub mod error;
pub mod filter;
pub mod pagination;
pub mod query;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use filter::{build_filter, ArticleFilter, Comparison, Field, Predicate, SearchWindow};
pub use pagination::{Page, PER_PAGE};
pub use query::{parse, Operator, ParsedQuery};
pub use storage::ArticleStorage;
pub use types::{parse_timestamp, Article, SortOrder, TIMESTAMP_FORMAT};

pub mod prelude {
    pub use crate::{
        build_filter, parse, Article, ArticleFilter, ArticleStorage, Error, Page, ParsedQuery,
        Result, SearchWindow, SortOrder,
    };
}

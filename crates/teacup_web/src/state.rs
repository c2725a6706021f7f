use std::sync::Arc;
use teacup_core::{ArticleStorage, SearchWindow};

pub struct AppState {
    pub storage: Arc<dyn ArticleStorage>,
    pub window: SearchWindow,
}

impl AppState {
    pub fn new(storage: Arc<dyn ArticleStorage>, window: SearchWindow) -> Self {
        Self { storage, window }
    }
}

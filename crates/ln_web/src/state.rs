use std::sync::Arc;

use ln_cache::CacheManager;
use ln_core::Summarizer;

pub struct AppState {
    pub cache: Arc<CacheManager>,
    pub summarizer: Arc<dyn Summarizer>,
}

impl AppState {
    pub fn new(cache: Arc<CacheManager>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self { cache, summarizer }
    }
}

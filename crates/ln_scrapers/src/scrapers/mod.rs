use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ln_core::{FetchError, RawItem, SourceKind, SourceSpec};

use crate::http::HttpClient;
use crate::retry::RetryPolicy;

pub mod feed;
pub mod page;
pub mod search;

pub use feed::FeedAdapter;
pub use page::PageAdapter;
pub use search::SearchAdapter;

/// Fetches and parses the raw items of one source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// The kind of source this adapter understands
    fn kind(&self) -> SourceKind;

    /// Fetches at most `spec.item_cap` raw items within `budget`.
    ///
    /// Every failure, including running out of time, comes back as a
    /// `FetchError`; implementations never panic on remote input.
    async fn fetch(&self, spec: &SourceSpec, budget: Duration) -> Result<Vec<RawItem>, FetchError>;
}

/// Picks the adapter for a source kind. `None` when the kind can't be
/// served with the current settings (a search source without an API key).
pub fn adapter_for(
    kind: SourceKind,
    http: &HttpClient,
    retry: RetryPolicy,
    news_api_key: Option<&str>,
) -> Option<Arc<dyn SourceAdapter>> {
    match kind {
        SourceKind::Feed => Some(Arc::new(FeedAdapter::new(http.clone(), retry))),
        SourceKind::Page => Some(Arc::new(PageAdapter::new(http.clone(), retry))),
        SourceKind::Search => news_api_key
            .map(|key| Arc::new(SearchAdapter::new(http.clone(), retry, key)) as Arc<dyn SourceAdapter>),
    }
}

/// Runs one fetch attempt under the retry policy and the hard budget, then
/// applies the per-source item cap.
pub(crate) async fn guarded<F, Fut>(
    spec: &SourceSpec,
    budget: Duration,
    retry: &RetryPolicy,
    op: F,
) -> Result<Vec<RawItem>, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<RawItem>, FetchError>>,
{
    match tokio::time::timeout(budget, retry.run(&spec.name, op)).await {
        Ok(Ok(mut items)) => {
            items.truncate(spec.item_cap);
            Ok(items)
        }
        Ok(Err(e)) => Err(e),
        Err(_) => Err(FetchError::timeout(&spec.name, budget)),
    }
}

/// Common utilities for adapters and article extraction
pub mod utils {
    use scraper::{ElementRef, Html, Selector};
    use tracing::warn;

    pub fn collapse_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn element_text(element: &ElementRef<'_>) -> String {
        collapse_whitespace(&element.text().collect::<String>())
    }

    pub fn parse_selector(selector: &str) -> Option<Selector> {
        match Selector::parse(selector) {
            Ok(selector) => Some(selector),
            Err(e) => {
                warn!("Skipping invalid selector {:?}: {:?}", selector, e);
                None
            }
        }
    }

    /// Walks `selectors` in order and returns the longest element text of the
    /// first selector whose best match exceeds `min_len` characters. Falls back
    /// to the longest text seen overall.
    pub fn longest_text(document: &Html, selectors: &[&str], min_len: usize) -> Option<String> {
        let mut best = String::new();
        for raw in selectors {
            let Some(selector) = parse_selector(raw) else {
                continue;
            };
            for element in document.select(&selector) {
                let text = element_text(&element);
                if text.chars().count() > best.chars().count() {
                    best = text;
                }
            }
            if best.chars().count() > min_len {
                return Some(best);
            }
        }
        if best.is_empty() {
            None
        } else {
            Some(best)
        }
    }
}

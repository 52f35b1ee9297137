use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use ln_core::{FetchError, FetchErrorKind, RawItem, SourceKind, SourceSpec};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::utils::{element_text, parse_selector};
use super::{guarded, SourceAdapter};
use crate::http::HttpClient;
use crate::retry::RetryPolicy;

lazy_static! {
    static ref ANCHOR: Selector = Selector::parse("a[href]").unwrap();
}

/// HTML listing pages scraped with an ordered list of candidate selectors.
#[derive(Debug, Clone)]
pub struct PageAdapter {
    http: HttpClient,
    retry: RetryPolicy,
}

impl PageAdapter {
    pub fn new(http: HttpClient, retry: RetryPolicy) -> Self {
        Self { http, retry }
    }

    async fn fetch_once(&self, spec: &SourceSpec, budget: Duration) -> Result<Vec<RawItem>, FetchError> {
        let html = self.http.get_text(&spec.name, &spec.endpoint, budget).await?;
        extract_items(spec, &html)
    }
}

/// Extracts headline links from a listing page.
///
/// Candidate selectors are tried in order; the first region whose combined
/// headline text exceeds `min_region_len` characters wins, so navigation menus that
/// match an early selector with a handful of short labels are skipped.
/// When no region is long enough the longest one is used.
pub fn extract_items(spec: &SourceSpec, html: &str) -> Result<Vec<RawItem>, FetchError> {
    let document = Html::parse_document(html);
    let mut best: Vec<RawItem> = Vec::new();
    let mut best_len = 0;

    for raw in &spec.rules.selectors {
        let Some(selector) = parse_selector(raw) else {
            continue;
        };
        let items = region_items(&document, &selector);
        let text_len: usize = items.iter().map(|i| i.title.chars().count()).sum();
        debug!("{}: selector {:?} matched {} items ({} chars)", spec.name, raw, items.len(), text_len);

        if text_len > spec.rules.min_region_len {
            return Ok(items);
        }
        if text_len > best_len {
            best_len = text_len;
            best = items;
        }
    }

    if best.is_empty() {
        return Err(FetchError::new(
            FetchErrorKind::ParseFailure,
            &spec.name,
            "no candidate selector matched any headline",
        ));
    }
    Ok(best)
}

fn region_items(document: &Html, selector: &Selector) -> Vec<RawItem> {
    let mut seen = HashSet::new();
    document
        .select(selector)
        .filter_map(anchor_item)
        .filter(|item| seen.insert(item.link.clone()))
        .collect()
}

fn anchor_item(element: ElementRef<'_>) -> Option<RawItem> {
    let anchor = if element.value().attr("href").is_some() {
        element
    } else {
        element.select(&ANCHOR).next()?
    };
    let link = anchor.value().attr("href")?.trim();
    if link.is_empty() || link.starts_with('#') || link.starts_with("javascript:") {
        return None;
    }

    let mut title = element_text(&element);
    if title.is_empty() {
        title = anchor.value().attr("title").unwrap_or_default().trim().to_string();
    }
    if title.is_empty() {
        return None;
    }
    Some(RawItem::new(title, link))
}

#[async_trait]
impl SourceAdapter for PageAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Page
    }

    async fn fetch(&self, spec: &SourceSpec, budget: Duration) -> Result<Vec<RawItem>, FetchError> {
        guarded(spec, budget, &self.retry, || self.fetch_once(spec, budget)).await
    }
}

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use ln_core::{FetchError, FetchErrorKind, RawItem, SourceKind, SourceSpec};
use serde::Deserialize;

use super::{guarded, SourceAdapter};
use crate::http::HttpClient;
use crate::retry::RetryPolicy;

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<SearchArticle>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchArticle {
    source: Option<SearchSource>,
    title: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct SearchSource {
    name: Option<String>,
}

/// NewsAPI-compatible headline search. The endpoint carries the query
/// (country, category, page size); the key travels in a header.
#[derive(Clone)]
pub struct SearchAdapter {
    http: HttpClient,
    retry: RetryPolicy,
    api_key: String,
}

impl fmt::Debug for SearchAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchAdapter")
            .field("retry", &self.retry)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl SearchAdapter {
    pub fn new(http: HttpClient, retry: RetryPolicy, api_key: impl Into<String>) -> Self {
        Self {
            http,
            retry,
            api_key: api_key.into(),
        }
    }

    async fn fetch_once(&self, spec: &SourceSpec, budget: Duration) -> Result<Vec<RawItem>, FetchError> {
        let request = self
            .http
            .get(&spec.endpoint, budget)
            .header("X-Api-Key", &self.api_key);
        let response = self.http.send(&spec.name, request).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(&spec.name, &e))?;
        parse_search(&spec.name, &body)
    }
}

pub fn parse_search(source_name: &str, body: &[u8]) -> Result<Vec<RawItem>, FetchError> {
    let response: SearchResponse = serde_json::from_slice(body).map_err(|e| {
        FetchError::new(FetchErrorKind::ParseFailure, source_name, format!("Invalid search response: {}", e))
    })?;

    if response.status == "error" {
        let code = response.code.unwrap_or_default();
        let kind = match code.as_str() {
            "rateLimited" => FetchErrorKind::RateLimited,
            c if c.starts_with("apiKey") => FetchErrorKind::Blocked,
            _ => FetchErrorKind::Unreachable,
        };
        let message = response.message.unwrap_or(code);
        return Err(FetchError::new(kind, source_name, message));
    }

    Ok(response
        .articles
        .into_iter()
        .filter_map(|a| {
            let title = a.title.filter(|t| !t.trim().is_empty())?;
            let link = a.url.filter(|u| !u.trim().is_empty())?;
            Some(RawItem {
                title,
                link,
                published: a.published_at,
                description: a.description,
                category: None,
                source: a.source.and_then(|s| s.name).filter(|n| !n.trim().is_empty()),
            })
        })
        .collect())
}

#[async_trait]
impl SourceAdapter for SearchAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Search
    }

    async fn fetch(&self, spec: &SourceSpec, budget: Duration) -> Result<Vec<RawItem>, FetchError> {
        guarded(spec, budget, &self.retry, || self.fetch_once(spec, budget)).await
    }
}

use std::time::Duration;

use async_trait::async_trait;
use ln_core::{FetchError, FetchErrorKind, RawItem, SourceKind, SourceSpec};
use tracing::debug;

use super::{guarded, SourceAdapter};
use crate::http::HttpClient;
use crate::retry::RetryPolicy;

/// RSS and Atom feeds.
#[derive(Debug, Clone)]
pub struct FeedAdapter {
    http: HttpClient,
    retry: RetryPolicy,
}

impl FeedAdapter {
    pub fn new(http: HttpClient, retry: RetryPolicy) -> Self {
        Self { http, retry }
    }

    async fn fetch_once(&self, spec: &SourceSpec, budget: Duration) -> Result<Vec<RawItem>, FetchError> {
        let body = self.http.get_bytes(&spec.name, &spec.endpoint, budget).await?;
        parse_feed(&spec.name, &body)
    }
}

/// Parses a feed document into raw items, skipping entries without a title or link.
pub fn parse_feed(source_name: &str, body: &[u8]) -> Result<Vec<RawItem>, FetchError> {
    let feed = feed_rs::parser::parse(body).map_err(|e| {
        FetchError::new(FetchErrorKind::ParseFailure, source_name, format!("Failed to parse feed: {}", e))
    })?;

    let items: Vec<RawItem> = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let title = entry.title.map(|t| t.content.trim().to_string()).unwrap_or_default();
            let link = entry
                .links
                .first()
                .map(|l| l.href.trim().to_string())
                .unwrap_or_default();
            if title.is_empty() || link.is_empty() {
                return None;
            }
            Some(RawItem {
                title,
                link,
                published: entry.published.or(entry.updated).map(|dt| dt.to_rfc3339()),
                description: entry.summary.map(|s| s.content),
                category: entry.categories.first().map(|c| c.term.clone()),
                source: None,
            })
        })
        .collect();

    debug!("Parsed {} entries from {}", items.len(), source_name);
    Ok(items)
}

#[async_trait]
impl SourceAdapter for FeedAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Feed
    }

    async fn fetch(&self, spec: &SourceSpec, budget: Duration) -> Result<Vec<RawItem>, FetchError> {
        guarded(spec, budget, &self.retry, || self.fetch_once(spec, budget)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Economy</title>
    <link>https://www.mk.co.kr</link>
    <description>Economy news</description>
    <item>
      <title>Base rate held at 3.5%</title>
      <link>https://www.mk.co.kr/news/economy/1</link>
      <pubDate>Wed, 01 May 2024 09:00:00 +0900</pubDate>
      <description>&lt;p&gt;The central bank kept rates&lt;/p&gt;</description>
      <category>economy</category>
    </item>
    <item>
      <title></title>
      <link>https://www.mk.co.kr/news/economy/2</link>
    </item>
    <item>
      <title>Exports rebound in April</title>
      <link>https://www.mk.co.kr/news/economy/3</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_feed() {
        let items = parse_feed("MK", RSS.as_bytes()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Base rate held at 3.5%");
        assert_eq!(items[0].link, "https://www.mk.co.kr/news/economy/1");
        assert_eq!(items[0].published.as_deref(), Some("2024-05-01T00:00:00+00:00"));
        assert_eq!(items[0].category.as_deref(), Some("economy"));
        assert!(items[0].description.as_deref().unwrap().contains("central bank"));
        assert!(items[1].published.is_none());
    }

    #[test]
    fn test_parse_garbage_is_parse_failure() {
        let err = parse_feed("MK", b"<html><body>not a feed</body></html>").unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::ParseFailure);
        assert_eq!(err.source_name, "MK");
    }

    #[tokio::test]
    async fn test_fetch_caps_items() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rss")
            .with_status(200)
            .with_header("content-type", "application/rss+xml")
            .with_body(RSS)
            .create_async()
            .await;

        let spec = SourceSpec::new("MK", format!("{}/rss", server.url()), SourceKind::Feed).with_item_cap(1);
        let adapter = FeedAdapter::new(HttpClient::new().unwrap(), RetryPolicy::none());
        let items = adapter.fetch(&spec, Duration::from_secs(5)).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Base rate held at 3.5%");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_maps_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rss")
            .with_status(429)
            .expect(1)
            .create_async()
            .await;

        let spec = SourceSpec::new("MK", format!("{}/rss", server.url()), SourceKind::Feed);
        let adapter = FeedAdapter::new(HttpClient::new().unwrap(), RetryPolicy::default());
        let err = adapter.fetch(&spec, Duration::from_secs(5)).await.unwrap_err();

        assert_eq!(err.kind, FetchErrorKind::RateLimited);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_retries_server_errors_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rss")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let spec = SourceSpec::new("MK", format!("{}/rss", server.url()), SourceKind::Feed);
        let retry = RetryPolicy {
            max_retries: 1,
            delay: Duration::from_millis(10),
        };
        let adapter = FeedAdapter::new(HttpClient::new().unwrap(), retry);
        let err = adapter.fetch(&spec, Duration::from_secs(5)).await.unwrap_err();

        assert_eq!(err.kind, FetchErrorKind::Unreachable);
        mock.assert_async().await;
    }
}

use std::time::Duration;

use ln_core::{Error, Result, SummaryError};
use ln_scrapers::scrapers::utils::{collapse_whitespace, longest_text};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use scraper::Html;
use tracing::debug;
use url::Url;

pub const PAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Text shorter than this is not worth sending to a model.
pub const MIN_ARTICLE_CHARS: usize = 100;
/// Longer text is cut before summarizing.
pub const MAX_ARTICLE_CHARS: usize = 4000;
/// A selector match longer than this is taken as the article body.
const BODY_THRESHOLD: usize = 200;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Body containers used by common Korean and international news sites.
pub const BODY_SELECTORS: &[&str] = &[
    "article",
    ".article-content",
    ".news-content",
    ".entry-content",
    ".post-content",
    ".content",
    "#articleBodyContents",
    ".article_body",
    ".article-body",
    ".story-body__inner",
    ".story-body",
    "div[data-module=\"ArticleBody\"]",
    ".art_txt",
    ".read_body",
];

/// Pulls the main text out of an article page, falling back to the whole
/// body when no known container holds enough text.
pub fn extract_article_text(html: &str) -> String {
    let document = Html::parse_document(html);
    match longest_text(&document, BODY_SELECTORS, BODY_THRESHOLD) {
        Some(text) if text.chars().count() >= BODY_THRESHOLD => text,
        _ => longest_text(&document, &["body"], 0).unwrap_or_default(),
    }
}

/// Rejects text that is too short and caps text that is too long.
pub fn prepare_text(text: &str) -> std::result::Result<String, SummaryError> {
    let text = collapse_whitespace(text);
    let len = text.chars().count();
    if len < MIN_ARTICLE_CHARS {
        return Err(SummaryError::InsufficientContent(len));
    }
    Ok(text.chars().take(MAX_ARTICLE_CHARS).collect())
}

/// Downloads article pages the way a browser would.
#[derive(Debug, Clone)]
pub struct ArticleFetcher {
    client: Client,
    timeout: Duration,
}

impl ArticleFetcher {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"));
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            timeout: PAGE_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetches `url` and returns its extracted article text.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!("{}: only http(s) articles can be summarized", url)));
        }

        let response = self
            .client
            .get(parsed)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_page_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SummaryError::Other(format!("article page answered HTTP {}", status.as_u16())).into());
        }
        let html = response.text().await.map_err(map_page_error)?;
        let text = extract_article_text(&html);
        debug!("Extracted {} chars from {}", text.chars().count(), url);
        Ok(text)
    }
}

fn map_page_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        SummaryError::Timeout.into()
    } else {
        SummaryError::Other(err.to_string()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(words: usize) -> String {
        vec!["경제"; words].join(" ")
    }

    #[test]
    fn test_prefers_known_container() {
        let html = format!(
            "<html><body><nav>메뉴 홈 경제</nav><div id=\"articleBodyContents\">{}</div><footer>copyright</footer></body></html>",
            paragraph(120)
        );
        let text = extract_article_text(&html);
        assert!(text.starts_with("경제 경제"));
        assert!(!text.contains("copyright"));
    }

    #[test]
    fn test_falls_back_to_body() {
        let html = format!("<html><body><article>short</article><p>{}</p></body></html>", paragraph(80));
        let text = extract_article_text(&html);
        assert!(text.starts_with("short"));
        assert!(text.chars().count() > 200);
    }

    #[test]
    fn test_prepare_text_bounds() {
        assert_eq!(prepare_text("too short"), Err(SummaryError::InsufficientContent(9)));
        let long = "가".repeat(5000);
        assert_eq!(prepare_text(&long).unwrap().chars().count(), MAX_ARTICLE_CHARS);
    }

    #[tokio::test]
    async fn test_fetch_text_sends_browser_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/article/1")
            .match_header("accept-language", "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(format!("<article>{}</article>", paragraph(150)))
            .create_async()
            .await;

        let fetcher = ArticleFetcher::new().unwrap();
        let text = fetcher.fetch_text(&format!("{}/article/1", server.url())).await.unwrap();
        assert!(text.chars().count() > 200);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_text_rejects_non_http() {
        let fetcher = ArticleFetcher::new().unwrap();
        assert!(matches!(fetcher.fetch_text("file:///etc/passwd").await, Err(Error::InvalidUrl(_))));
        assert!(matches!(fetcher.fetch_text("not a url").await, Err(Error::InvalidUrl(_))));
    }
}

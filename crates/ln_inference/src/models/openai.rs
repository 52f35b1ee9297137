use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use ln_core::{Error, Result, Summarizer, SummaryError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::extract::{prepare_text, ArticleFetcher};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const API_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_TOKENS: u32 = 300;
const TEMPERATURE: f32 = 0.3;
/// Completions shorter than this are treated as failures.
const MIN_SUMMARY_CHARS: usize = 20;

const SYSTEM_PROMPT: &str = "당신은 뉴스 기사를 요약하는 전문가입니다. 주요 내용을 3-4문장으로 간결하고 명확하게 요약해주세요. 중요한 사실과 핵심 정보를 포함해야 합니다.";

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

/// Summarizes articles with an OpenAI-compatible chat completion endpoint.
pub struct OpenAiSummarizer {
    client: Client,
    fetcher: ArticleFetcher,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OpenAiSummarizer {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::Config("OpenAI API key is required".to_string()));
        }
        Ok(Self {
            client: Client::new(),
            fetcher: ArticleFetcher::new()?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: API_TIMEOUT,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_fetcher(mut self, fetcher: ArticleFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    async fn complete(&self, text: &str) -> std::result::Result<String, SummaryError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!("다음 뉴스 기사를 한국어로 요약해주세요:\n\n{}", text),
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(map_api_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SummaryError::from_status(status.as_u16()));
        }

        let body = response.json::<ChatResponse>().await.map_err(map_api_error)?;
        let summary = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();

        if summary.chars().count() < MIN_SUMMARY_CHARS {
            return Err(SummaryError::TooShort);
        }
        Ok(summary)
    }
}

fn map_api_error(err: reqwest::Error) -> SummaryError {
    if err.is_timeout() {
        SummaryError::Timeout
    } else if let Some(status) = err.status() {
        SummaryError::from_status(status.as_u16())
    } else {
        SummaryError::Other(err.to_string())
    }
}

impl fmt::Debug for OpenAiSummarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiSummarizer")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn summarize_url(&self, url: &str) -> Result<String> {
        let text = self.fetcher.fetch_text(url).await?;
        self.summarize_text(&text).await
    }

    async fn summarize_text(&self, text: &str) -> Result<String> {
        let text = prepare_text(text)?;
        debug!("🤖 Summarizing {} chars with {}", text.chars().count(), self.model);
        self.complete(&text).await.map_err(|e| {
            warn!("⚠️ Summary request failed: {}", e);
            Error::Summary(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const SUMMARY: &str = "코스피가 외국인 매수세에 힘입어 상승 마감했다. 반도체 업종이 지수 상승을 이끌었다.";

    fn article_text() -> String {
        "코스피가 외국인 순매수에 힘입어 사흘 만에 반등했다. ".repeat(10)
    }

    fn completion(content: &str) -> String {
        serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
        })
        .to_string()
    }

    fn summarizer(server: &mockito::Server) -> OpenAiSummarizer {
        OpenAiSummarizer::new("sk-test").unwrap().with_base_url(server.url())
    }

    #[test]
    fn test_requires_api_key() {
        assert!(matches!(OpenAiSummarizer::new("  "), Err(Error::Config(_))));
    }

    #[test]
    fn test_debug_redacts_key() {
        let model = OpenAiSummarizer::new("sk-secret").unwrap();
        let debug = format!("{:?}", model);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_summarize_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 300
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion(&format!("  {}  ", SUMMARY)))
            .create_async()
            .await;

        let summary = summarizer(&server).summarize_text(&article_text()).await.unwrap();
        assert_eq!(summary, SUMMARY);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_status_errors_are_mapped() {
        for (status, expected) in [
            (401, SummaryError::InvalidKey),
            (429, SummaryError::RateLimited),
            (500, SummaryError::Upstream(500)),
        ] {
            let mut server = mockito::Server::new_async().await;
            server
                .mock("POST", "/chat/completions")
                .with_status(status)
                .create_async()
                .await;

            let err = summarizer(&server).summarize_text(&article_text()).await.unwrap_err();
            match err {
                Error::Summary(e) => assert_eq!(e, expected),
                other => panic!("unexpected error: {}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_short_completion_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion("요약 불가"))
            .create_async()
            .await;

        let err = summarizer(&server).summarize_text(&article_text()).await.unwrap_err();
        assert!(matches!(err, Error::Summary(SummaryError::TooShort)));
    }

    #[tokio::test]
    async fn test_short_article_never_reaches_api() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/chat/completions").expect(0).create_async().await;

        let err = summarizer(&server).summarize_text("짧은 기사").await.unwrap_err();
        assert!(matches!(err, Error::Summary(SummaryError::InsufficientContent(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_summarize_url_end_to_end() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/news/1")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(format!("<html><body><div class=\"article_body\">{}</div></body></html>", article_text()))
            .create_async()
            .await;
        server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::Regex("사흘 만에 반등".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion(SUMMARY))
            .create_async()
            .await;

        let summary = summarizer(&server)
            .summarize_url(&format!("{}/news/1", server.url()))
            .await
            .unwrap();
        assert_eq!(summary, SUMMARY);
    }
}

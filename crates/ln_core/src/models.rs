use async_trait::async_trait;
use crate::Result;

#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;

    /// Fetches the article behind `url` and returns a short summary of it.
    async fn summarize_url(&self, url: &str) -> Result<String>;

    /// Summarizes already extracted article text.
    async fn summarize_text(&self, text: &str) -> Result<String>;
}

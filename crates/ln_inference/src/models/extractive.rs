use async_trait::async_trait;
use ln_core::{Result, Summarizer, SummaryError};

use crate::extract::{prepare_text, ArticleFetcher};

const MIN_SENTENCE_CHARS: usize = 20;
const MAX_SENTENCES: usize = 3;
const MIN_SUMMARY_CHARS: usize = 50;

/// Picks the leading sentences of the article. Used when no model API key
/// is configured.
#[derive(Debug, Clone)]
pub struct ExtractiveSummarizer {
    fetcher: ArticleFetcher,
}

impl ExtractiveSummarizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            fetcher: ArticleFetcher::new()?,
        })
    }

    pub fn with_fetcher(fetcher: ArticleFetcher) -> Self {
        Self { fetcher }
    }
}

/// Joins the first few substantial sentences of `text`.
pub fn leading_sentences(text: &str) -> std::result::Result<String, SummaryError> {
    let sentences: Vec<&str> = text
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .take(MAX_SENTENCES)
        .collect();

    if sentences.is_empty() {
        return Err(SummaryError::InsufficientContent(text.chars().count()));
    }
    let summary = sentences.join(". ") + ".";
    if summary.chars().count() <= MIN_SUMMARY_CHARS {
        return Err(SummaryError::TooShort);
    }
    tracing::debug!("Generated extractive summary: {}", summary);
    Ok(summary)
}

#[async_trait]
impl Summarizer for ExtractiveSummarizer {
    fn name(&self) -> &str {
        "Extractive"
    }

    async fn summarize_url(&self, url: &str) -> Result<String> {
        let text = self.fetcher.fetch_text(url).await?;
        self.summarize_text(&text).await
    }

    async fn summarize_text(&self, text: &str) -> Result<String> {
        let text = prepare_text(text)?;
        Ok(leading_sentences(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ln_core::Error;

    const TEXT: &str = "Seoul shares closed higher on Wednesday as foreigners bought chip stocks. \
        The won weakened against the dollar! Bond yields were mixed across maturities? \
        Analysts expect the central bank to hold rates at its next meeting. \
        Exporters welcomed the weaker currency.";

    #[test]
    fn test_leading_sentences() {
        let summary = leading_sentences(TEXT).unwrap();
        assert_eq!(
            summary,
            "Seoul shares closed higher on Wednesday as foreigners bought chip stocks. \
             The won weakened against the dollar. Bond yields were mixed across maturities."
        );
    }

    #[test]
    fn test_short_sentences_are_skipped() {
        assert!(matches!(leading_sentences("Up. Down. Flat."), Err(SummaryError::InsufficientContent(_))));
        assert_eq!(
            leading_sentences("A single sentence that is long enough."),
            Err(SummaryError::TooShort)
        );
    }

    #[tokio::test]
    async fn test_summarize_text_checks_length() {
        let model = ExtractiveSummarizer::new().unwrap();
        assert!(model.summarize_text(TEXT).await.unwrap().starts_with("Seoul shares"));
        assert!(matches!(
            model.summarize_text("too short").await,
            Err(Error::Summary(SummaryError::InsufficientContent(9)))
        ));
    }
}

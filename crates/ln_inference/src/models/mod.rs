use std::sync::Arc;

use ln_core::{Result, Settings, Summarizer};
use tracing::info;

pub mod extractive;
pub mod openai;

pub use extractive::ExtractiveSummarizer;
pub use openai::OpenAiSummarizer;

/// OpenAI when a key is configured, the extractive summarizer otherwise.
pub fn create_summarizer(settings: &Settings) -> Result<Arc<dyn Summarizer>> {
    let summarizer: Arc<dyn Summarizer> = match settings.openai_api_key.as_deref() {
        Some(key) => Arc::new(OpenAiSummarizer::new(key)?),
        None => Arc::new(ExtractiveSummarizer::new()?),
    };
    info!("🧠 Summarizer initialized (using {})", summarizer.name());
    Ok(summarizer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_summarizer_picks_by_key() {
        let settings = Settings::default();
        assert_eq!(create_summarizer(&settings).unwrap().name(), "Extractive");

        let settings = Settings {
            openai_api_key: Some("sk-test".to_string()),
            ..Settings::default()
        };
        assert_eq!(create_summarizer(&settings).unwrap().name(), "OpenAI");
    }
}

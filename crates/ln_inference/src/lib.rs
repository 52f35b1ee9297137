use ln_core::{Error, Result};

pub mod extract;
pub mod models;

pub use models::create_summarizer;

/// Turns a summarizer outcome into text fit for end users. Failures become
/// a readable explanation rather than an error.
pub fn summary_or_message(result: Result<String>) -> String {
    match result {
        Ok(summary) => summary,
        Err(Error::Summary(e)) => e.user_message().to_string(),
        Err(e) => {
            tracing::warn!("⚠️ Summarization failed: {}", e);
            ln_core::SummaryError::Other(e.to_string()).user_message().to_string()
        }
    }
}

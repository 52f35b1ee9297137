use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Summary(#[from] SummaryError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a single source produced nothing this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// The per-call budget ran out.
    Timeout,
    /// DNS, connection or server-side failure.
    Unreachable,
    /// The body could not be read as a feed, page or JSON document.
    ParseFailure,
    /// HTTP 429.
    RateLimited,
    /// HTTP 401/403/404 family (any other 4xx) or an anti-bot wall.
    Blocked,
}

impl FetchErrorKind {
    /// Only transient failures are worth a second attempt.
    pub fn is_transient(self) -> bool {
        matches!(self, FetchErrorKind::Unreachable)
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchErrorKind::Timeout => "timeout",
            FetchErrorKind::Unreachable => "unreachable",
            FetchErrorKind::ParseFailure => "parse failure",
            FetchErrorKind::RateLimited => "rate limited",
            FetchErrorKind::Blocked => "blocked",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{source_name}: {kind}: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub source_name: String,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn timeout(source_name: impl Into<String>, budget: std::time::Duration) -> Self {
        Self::new(
            FetchErrorKind::Timeout,
            source_name,
            format!("no response within {}ms", budget.as_millis()),
        )
    }

    /// Classifies an HTTP status that is not a success.
    pub fn from_status(source_name: impl Into<String>, status: u16) -> Self {
        let kind = match status {
            429 => FetchErrorKind::RateLimited,
            408 => FetchErrorKind::Timeout,
            400..=499 => FetchErrorKind::Blocked,
            _ => FetchErrorKind::Unreachable,
        };
        Self::new(kind, source_name, format!("HTTP {}", status))
    }

    pub fn from_reqwest(source_name: impl Into<String>, err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_status(source_name, status.as_u16());
        }
        let kind = if err.is_timeout() {
            FetchErrorKind::Timeout
        } else if err.is_decode() || err.is_body() {
            FetchErrorKind::ParseFailure
        } else {
            FetchErrorKind::Unreachable
        };
        Self::new(kind, source_name, err.to_string())
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

/// Failures of the external summarizer, each with a message fit for end users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SummaryError {
    #[error("summarizer rejected the API key")]
    InvalidKey,
    #[error("summarizer rate limit exceeded")]
    RateLimited,
    #[error("summarizer upstream error: HTTP {0}")]
    Upstream(u16),
    #[error("summarizer request timed out")]
    Timeout,
    #[error("article text too short to summarize ({0} chars)")]
    InsufficientContent(usize),
    #[error("summary too short")]
    TooShort,
    #[error("summarizer failed: {0}")]
    Other(String),
}

impl SummaryError {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => SummaryError::InvalidKey,
            429 => SummaryError::RateLimited,
            s if s >= 500 => SummaryError::Upstream(s),
            s => SummaryError::Other(format!("HTTP {}", s)),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            SummaryError::InvalidKey => "The summarization API key is invalid.",
            SummaryError::RateLimited => "The summarization quota is exhausted. Please try again shortly.",
            SummaryError::Upstream(_) => "The summarization server returned an error. Please try again shortly.",
            SummaryError::Timeout => "The summary request timed out. Please try again.",
            SummaryError::InsufficientContent(_) => "Not enough article text could be retrieved to summarize it.",
            SummaryError::TooShort => "The generated summary was too short. Please try again.",
            SummaryError::Other(_) => "Something went wrong while summarizing. Please try again.",
        }
    }
}

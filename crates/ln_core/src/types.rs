use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ko,
    En,
    #[default]
    Unspecified,
}

/// A cleaned news item, ready to be served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub source: String,
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub language: Language,
}

/// An item as a source adapter found it, before any cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub title: String,
    pub link: String,
    pub published: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Publisher reported by the item itself, overriding the source name.
    pub source: Option<String>,
}

impl RawItem {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Feed,
    Page,
    Search,
}

impl SourceKind {
    pub fn default_timeout(self) -> Duration {
        match self {
            SourceKind::Feed => crate::config::FEED_TIMEOUT,
            SourceKind::Page => crate::config::PAGE_TIMEOUT,
            SourceKind::Search => crate::config::SEARCH_TIMEOUT,
        }
    }
}

/// Extraction rules for `page` sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRules {
    /// Candidate selectors, tried in order.
    #[serde(default)]
    pub selectors: Vec<String>,
    /// A region is accepted once its extracted text exceeds this many chars.
    #[serde(default = "default_min_region_len")]
    pub min_region_len: usize,
}

fn default_min_region_len() -> usize {
    crate::config::MIN_REGION_TEXT_LEN
}

impl Default for PageRules {
    fn default() -> Self {
        Self {
            selectors: Vec::new(),
            min_region_len: default_min_region_len(),
        }
    }
}

/// Static description of one news source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub name: String,
    pub endpoint: String,
    pub kind: SourceKind,
    #[serde(default = "default_item_cap")]
    pub item_cap: usize,
    /// Overrides the per-kind default budget.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub rules: PageRules,
}

fn default_item_cap() -> usize {
    crate::config::DEFAULT_ITEM_CAP
}

impl SourceSpec {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            kind,
            item_cap: default_item_cap(),
            timeout_secs: None,
            language: Language::Unspecified,
            category: None,
            rules: PageRules::default(),
        }
    }

    pub fn with_item_cap(mut self, item_cap: usize) -> Self {
        self.item_cap = item_cap;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_selectors<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.selectors = selectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs().max(1));
        self
    }

    /// Wall-clock budget for one fetch of this source.
    pub fn budget(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.kind.default_timeout())
    }

    pub fn endpoint_url(&self) -> Result<Url> {
        Url::parse(&self.endpoint).map_err(|e| Error::InvalidUrl(format!("{}: {}", self.endpoint, e)))
    }

    /// Checks the spec is usable before any fetch is attempted.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Config(format!("source with endpoint {} has no name", self.endpoint)));
        }
        let url = self.endpoint_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!("{}: endpoint must be http(s), got {}", self.name, url.scheme())));
        }
        if self.item_cap == 0 {
            return Err(Error::Config(format!("{}: item_cap must be at least 1", self.name)));
        }
        if self.kind == SourceKind::Page && self.rules.selectors.is_empty() {
            return Err(Error::Config(format!("{}: page sources need at least one selector", self.name)));
        }
        Ok(())
    }
}

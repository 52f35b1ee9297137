use std::env;
use std::time::Duration;

use crate::{Error, Result};

/// How long an aggregation result is served before it counts as stale.
pub const CACHE_TTL: Duration = Duration::from_secs(10 * 60);
/// Period of the background refresh.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);

pub const FEED_TIMEOUT: Duration = Duration::from_secs(15);
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(10);
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);

pub const RETRY_DELAY: Duration = Duration::from_millis(500);
pub const MAX_RETRIES: u32 = 1;

pub const MIN_TITLE_LEN: usize = 5;
pub const DESCRIPTION_LIMIT: usize = 150;
pub const MIN_REGION_TEXT_LEN: usize = 40;
pub const DEFAULT_ITEM_CAP: usize = 5;

pub const MAX_RESULTS: usize = 20;
pub const MIN_VIABLE: usize = 10;

pub const DEFAULT_PORT: u16 = 3000;
pub const USER_AGENT: &str = concat!("Mozilla/5.0 (compatible; LiveNewsBot/", env!("CARGO_PKG_VERSION"), ")");

/// Bounds applied to every aggregation round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationConfig {
    pub max_results: usize,
    pub min_viable: usize,
    pub min_title_len: usize,
    pub description_limit: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_results: MAX_RESULTS,
            min_viable: MIN_VIABLE,
            min_title_len: MIN_TITLE_LEN,
            description_limit: DESCRIPTION_LIMIT,
        }
    }
}

/// Process settings read from the environment.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub port: u16,
    pub news_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub allowed_origins: Vec<String>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("port", &self.port)
            .field("news_api_key", &self.news_api_key.as_deref().map(|_| "<redacted>"))
            .field("openai_api_key", &self.openai_api_key.as_deref().map(|_| "<redacted>"))
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| Error::Config(format!("PORT must be a port number, got {:?}: {}", raw, e)))?,
            None => DEFAULT_PORT,
        };

        let allowed_origins = non_empty("ALLOWED_ORIGIN")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().trim_end_matches('/').to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            port,
            news_api_key: non_empty("NEWS_API_KEY"),
            openai_api_key: non_empty("OPENAI_API_KEY"),
            allowed_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.port, DEFAULT_PORT);
        assert!(settings.news_api_key.is_none());
        assert!(settings.allowed_origins.is_empty());
    }

    #[test]
    fn test_reads_values() {
        let settings = Settings::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("NEWS_API_KEY", "abc"),
            ("OPENAI_API_KEY", "  "),
            ("ALLOWED_ORIGIN", "https://a.netlify.app/, https://b.example"),
        ]))
        .unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.news_api_key.as_deref(), Some("abc"));
        assert!(settings.openai_api_key.is_none());
        assert_eq!(settings.allowed_origins, vec!["https://a.netlify.app", "https://b.example"]);
    }

    #[test]
    fn test_invalid_port() {
        let err = Settings::from_lookup(lookup(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let settings = Settings::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-secret")])).unwrap();
        assert!(!format!("{:?}", settings).contains("sk-secret"));
    }
}

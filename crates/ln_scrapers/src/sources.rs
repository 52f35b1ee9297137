use std::fs;
use std::path::Path;

use ln_core::{Error, Language, Result, SourceKind, SourceSpec};
use tracing::info;

const ECONOMY: &str = "economy";

/// Built-in Korean economy sources.
///
/// The search source is listed unconditionally; it is dropped when the
/// aggregator is built without a NEWS_API_KEY.
pub fn default_sources() -> Vec<SourceSpec> {
    vec![
        SourceSpec::new("AjuNews", "https://feeds.feedburner.com/ajunews_economy", SourceKind::Feed)
            .with_item_cap(7)
            .with_language(Language::Ko)
            .with_category(ECONOMY),
        SourceSpec::new("MK", "https://www.mk.co.kr/rss/30100041/", SourceKind::Feed)
            .with_item_cap(7)
            .with_language(Language::Ko)
            .with_category(ECONOMY),
        SourceSpec::new("Hankyung", "https://rss.hankyung.com/new/news_main.xml", SourceKind::Feed)
            .with_item_cap(7)
            .with_language(Language::Ko)
            .with_category(ECONOMY),
        SourceSpec::new(
            "NewsAPI",
            "https://newsapi.org/v2/top-headlines?country=kr&category=business&pageSize=10",
            SourceKind::Search,
        )
        .with_item_cap(10)
        .with_language(Language::Ko)
        .with_category("business"),
        SourceSpec::new("YTN", "https://www.ytn.co.kr/news/list.php?mcd=0102", SourceKind::Page)
            .with_language(Language::Ko)
            .with_category(ECONOMY)
            .with_selectors([".news_list .news_title a", ".newslist_area .title a", ".news_list li a"]),
        SourceSpec::new("SBS", "https://news.sbs.co.kr/news/newsList.do?ctgId=0800", SourceKind::Page)
            .with_language(Language::Ko)
            .with_category(ECONOMY)
            .with_selectors([".w_news_list .text a", ".w_news_list .desc a", ".news_list li a"]),
    ]
}

/// Parses a JSON array of source specs and validates each one.
pub fn parse_sources(json: &str) -> Result<Vec<SourceSpec>> {
    let specs: Vec<SourceSpec> = serde_json::from_str(json)?;
    if specs.is_empty() {
        return Err(Error::Config("source list is empty".to_string()));
    }
    for spec in &specs {
        spec.validate()?;
    }
    Ok(specs)
}

/// Specs from `path` when given, the built-in registry otherwise.
pub fn resolve(path: Option<&Path>) -> Result<Vec<SourceSpec>> {
    match path {
        Some(path) => load_from_file(path),
        None => Ok(default_sources()),
    }
}

pub fn load_from_file(path: impl AsRef<Path>) -> Result<Vec<SourceSpec>> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)?;
    let specs = parse_sources(&json)?;
    info!("📋 Loaded {} sources from {}", specs.len(), path.display());
    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_sources_are_valid() {
        let sources = default_sources();
        let names: HashSet<_> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), sources.len());
        for spec in &sources {
            spec.validate().unwrap();
        }
        assert_eq!(sources.iter().filter(|s| s.kind == SourceKind::Search).count(), 1);
    }

    #[test]
    fn test_parse_sources_applies_defaults() {
        let json = r#"[
            {"name": "MK", "endpoint": "https://www.mk.co.kr/rss/30100041/", "kind": "feed"},
            {"name": "SBS", "endpoint": "https://news.sbs.co.kr/news/newsList.do", "kind": "page",
             "language": "ko", "timeout_secs": 4, "rules": {"selectors": [".w_news_list .text a"]}}
        ]"#;
        let specs = parse_sources(json).unwrap();
        assert_eq!(specs[0].item_cap, 5);
        assert_eq!(specs[0].budget(), SourceKind::Feed.default_timeout());
        assert_eq!(specs[1].language, Language::Ko);
        assert_eq!(specs[1].budget().as_secs(), 4);
        assert_eq!(specs[1].rules.min_region_len, 40);
    }

    #[test]
    fn test_parse_sources_rejects_bad_input() {
        assert!(matches!(parse_sources("[]"), Err(Error::Config(_))));
        assert!(matches!(parse_sources("{"), Err(Error::Serialization(_))));
        let page_without_selectors = r#"[{"name": "SBS", "endpoint": "https://news.sbs.co.kr/", "kind": "page"}]"#;
        assert!(matches!(parse_sources(page_without_selectors), Err(Error::Config(_))));
    }

    #[test]
    fn test_resolve_without_path_uses_defaults() {
        assert_eq!(resolve(None).unwrap(), default_sources());
    }

    #[test]
    fn test_load_from_missing_file() {
        assert!(matches!(load_from_file("/nonexistent/sources.json"), Err(Error::Io(_))));
    }
}

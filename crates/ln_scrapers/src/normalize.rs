use chrono::{DateTime, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use ln_core::{AggregationConfig, Article, RawItem, SourceSpec};
use regex::Regex;
use scraper::Html;
use url::Url;

use crate::scrapers::utils::collapse_whitespace;

lazy_static! {
    static ref TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
}

const ELLIPSIS: &str = "...";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
];

/// Removes tag-like substrings, decodes entities and collapses whitespace.
pub fn clean_text(raw: &str) -> String {
    let without_tags = TAG.replace_all(raw, " ");
    let mut text = decode_entities(&without_tags);
    // Feeds often escape twice (`&amp;quot;`).
    if text.contains('&') && text != without_tags {
        text = decode_entities(&text);
    }
    collapse_whitespace(&text)
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    Html::parse_fragment(text).root_element().text().collect()
}

/// Caps `text` at `limit` characters, marking the cut with an ellipsis.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{}{}", cut.trim_end(), ELLIPSIS)
}

/// Resolves `link` against the origin of `endpoint`.
pub fn absolute_link(link: &str, endpoint: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(link) {
        return matches!(url.scheme(), "http" | "https").then(|| url.to_string());
    }
    let base = Url::parse(endpoint).ok()?;
    base.join(link).ok().map(|u| u.to_string())
}

/// Best-effort date parsing; naive timestamps are read as UTC.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Cleans one raw item into an article. Returns `None` for noise: titles
/// shorter than the configured minimum or links that can't be made absolute.
pub fn normalize(raw: RawItem, spec: &SourceSpec, config: &AggregationConfig, now: DateTime<Utc>) -> Option<Article> {
    let title = clean_text(&raw.title);
    if title.chars().count() < config.min_title_len {
        return None;
    }
    let link = absolute_link(&raw.link, &spec.endpoint)?;

    let description = raw
        .description
        .as_deref()
        .map(clean_text)
        .filter(|d| !d.is_empty())
        .map(|d| truncate_chars(&d, config.description_limit));

    let published_at = raw
        .published
        .as_deref()
        .and_then(parse_published)
        .unwrap_or(now);

    let source = raw
        .source
        .map(|s| clean_text(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| spec.name.clone());

    Some(Article {
        source,
        title,
        link,
        published_at,
        description,
        category: raw.category.map(|c| clean_text(&c)).filter(|c| !c.is_empty()).or_else(|| spec.category.clone()),
        language: spec.language,
    })
}

/// Normalizes a whole source list, dropping noise.
pub fn normalize_all(
    items: Vec<RawItem>,
    spec: &SourceSpec,
    config: &AggregationConfig,
    now: DateTime<Utc>,
) -> Vec<Article> {
    items
        .into_iter()
        .filter_map(|raw| normalize(raw, spec, config, now))
        .collect()
}

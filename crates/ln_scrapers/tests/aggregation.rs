use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use ln_core::{
    AggregationConfig, ArticleCollector, FetchError, FetchErrorKind, ManualClock, RawItem, SourceKind, SourceSpec,
};
use ln_scrapers::dedup::dedup_key;
use ln_scrapers::fallback::seed_articles;
use ln_scrapers::{Aggregator, SourceAdapter};

enum Script {
    Items(Vec<RawItem>),
    Fail(FetchErrorKind),
    Delayed(Duration, Vec<RawItem>),
    Hang,
}

struct ScriptedAdapter {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedAdapter {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SourceAdapter for ScriptedAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Feed
    }

    async fn fetch(&self, spec: &SourceSpec, _budget: Duration) -> Result<Vec<RawItem>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Items(items) => Ok(items.iter().take(spec.item_cap).cloned().collect()),
            Script::Fail(kind) => Err(FetchError::new(*kind, &spec.name, "scripted failure")),
            Script::Delayed(delay, items) => {
                tokio::time::sleep(*delay).await;
                Ok(items.iter().take(spec.item_cap).cloned().collect())
            }
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
        }
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn items(prefix: &str, count: usize, start_minute: u32) -> Vec<RawItem> {
    (0..count)
        .map(|i| {
            let mut item = RawItem::new(
                format!("{} headline number {}", prefix, i),
                format!("https://{}.example/news/{}", prefix.to_lowercase(), i),
            );
            item.published = Some(format!("2024-05-01T10:{:02}:00Z", start_minute + i as u32));
            item
        })
        .collect()
}

fn source(name: &str, script: Script) -> (SourceSpec, Arc<dyn SourceAdapter>) {
    let spec = SourceSpec::new(name, format!("https://{}.example/rss", name.to_lowercase()), SourceKind::Feed)
        .with_item_cap(10)
        .with_timeout(Duration::from_secs(2));
    (spec, ScriptedAdapter::new(script))
}

fn slow_source(name: &str, delay: Duration, items: Vec<RawItem>) -> (SourceSpec, Arc<dyn SourceAdapter>) {
    let spec = SourceSpec::new(name, format!("https://{}.example/rss", name.to_lowercase()), SourceKind::Feed)
        .with_item_cap(10)
        .with_timeout(Duration::from_secs(5));
    (spec, ScriptedAdapter::new(Script::Delayed(delay, items)))
}

fn aggregator(sources: Vec<(SourceSpec, Arc<dyn SourceAdapter>)>) -> Aggregator {
    Aggregator::new(sources, AggregationConfig::default())
        .unwrap()
        .with_clock(Arc::new(ManualClock::new(now())))
}

fn assert_well_formed(articles: &[ln_core::Article]) {
    let titles: HashSet<_> = articles.iter().map(|a| dedup_key(&a.title)).collect();
    let links: HashSet<_> = articles.iter().map(|a| dedup_key(&a.link)).collect();
    assert_eq!(titles.len(), articles.len(), "duplicate titles");
    assert_eq!(links.len(), articles.len(), "duplicate links");
    assert!(articles.windows(2).all(|w| w[0].published_at >= w[1].published_at), "not sorted");
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_isolated() {
    let aggregator = aggregator(vec![
        source("Alpha", Script::Items(items("Alpha", 5, 0))),
        source("Slow", Script::Hang),
        source("Beta", Script::Items(items("Beta", 5, 30))),
    ]);

    let (articles, report) = aggregator.collect_with_report().await;

    assert_eq!(articles.len(), 10);
    assert!(!report.fallback_used);
    assert!(articles.iter().all(|a| !a.link.starts_with("https://example.com/")));
    assert_well_formed(&articles);
    assert_eq!(articles[0].source, "Beta");

    let slow = &report.outcomes[1];
    assert_eq!(slow.name, "Slow");
    assert_eq!(slow.result.as_ref().unwrap_err().kind, FetchErrorKind::Timeout);
    assert_eq!(report.failed(), 1);
}

#[tokio::test]
async fn test_all_blocked_serves_seeds_exactly() {
    let aggregator = aggregator(vec![
        source("Alpha", Script::Fail(FetchErrorKind::Blocked)),
        source("Beta", Script::Fail(FetchErrorKind::Blocked)),
        source("Gamma", Script::Fail(FetchErrorKind::Blocked)),
    ]);

    let articles = aggregator.collect().await;
    assert_eq!(articles, seed_articles(now()));
}

#[tokio::test]
async fn test_collector_trait_never_fails() {
    let aggregator = aggregator(vec![source("Alpha", Script::Fail(FetchErrorKind::ParseFailure))]);
    let collector: &dyn ArticleCollector = &aggregator;
    let articles = collector.collect().await.unwrap();
    assert_eq!(articles.len(), 8);
}

#[tokio::test]
async fn test_cross_source_duplicates_keep_first_source() {
    let mut beta = items("Beta", 4, 10);
    // Same story as Alpha #2 under a different link and a newer timestamp.
    beta[0].title = "  ALPHA headline   number 2 ".to_string();
    // Same link as Alpha #3 under a different title.
    beta[1].link = "https://alpha.example/news/3".to_string();

    let aggregator = aggregator(vec![
        source("Alpha", Script::Items(items("Alpha", 6, 0))),
        source("Beta", Script::Items(beta)),
    ]);
    let (articles, report) = aggregator.collect_with_report().await;

    assert_eq!(report.live_count, 8);
    assert_eq!(articles.len(), 10);
    assert_well_formed(&articles);
    let alpha_two = articles.iter().find(|a| dedup_key(&a.title) == "alpha headline number 2").unwrap();
    assert_eq!(alpha_two.source, "Alpha");
}

#[tokio::test]
async fn test_result_is_capped_at_max_results() {
    let aggregator = aggregator(vec![
        source("Alpha", Script::Items(items("Alpha", 10, 0))),
        source("Beta", Script::Items(items("Beta", 10, 10))),
        source("Gamma", Script::Items(items("Gamma", 10, 20))),
    ]);
    let articles = aggregator.collect().await;

    assert_eq!(articles.len(), 20);
    assert_well_formed(&articles);
    assert!(articles.iter().all(|a| a.source != "Alpha"));
}

#[tokio::test]
async fn test_short_round_is_topped_up() {
    let aggregator = aggregator(vec![
        source("Alpha", Script::Items(items("Alpha", 2, 0))),
        source("Beta", Script::Fail(FetchErrorKind::RateLimited)),
    ]);
    let (articles, report) = aggregator.collect_with_report().await;

    assert!(report.fallback_used);
    assert_eq!(report.live_count, 2);
    assert_eq!(articles.len(), 10);
    assert_well_formed(&articles);
    assert_eq!(articles.iter().filter(|a| a.source == "Alpha").count(), 2);
}

#[tokio::test]
async fn test_noise_items_are_dropped() {
    let mut noisy = items("Alpha", 3, 0);
    noisy.push(RawItem::new("<b>Hi</b>", "https://alpha.example/short"));
    noisy.push(RawItem::new("A perfectly fine headline", "mailto:desk@alpha.example"));

    let aggregator = aggregator(vec![source("Alpha", Script::Items(noisy))]);
    let (_, report) = aggregator.collect_with_report().await;

    assert_eq!(report.outcomes[0].result.as_ref().copied().unwrap(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_sources_are_fetched_concurrently() {
    let aggregator = aggregator(vec![
        slow_source("Alpha", Duration::from_secs(2), items("Alpha", 4, 0)),
        slow_source("Beta", Duration::from_secs(2), items("Beta", 4, 10)),
        slow_source("Gamma", Duration::from_secs(2), items("Gamma", 4, 20)),
    ]);

    let started = tokio::time::Instant::now();
    let (articles, report) = aggregator.collect_with_report().await;

    assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
    assert_eq!(report.failed(), 0);
    assert_eq!(report.live_count, 12);
    assert_eq!(articles.len(), 12);
}

#[tokio::test(start_paused = true)]
async fn test_configuration_order_wins_over_completion_order() {
    let mut alpha = items("Alpha", 5, 0);
    alpha[0].title = "Kospi closes higher on chip rally".to_string();
    let mut beta = items("Beta", 5, 30);
    // Newer and faster, but configured second.
    beta[0].title = "KOSPI closes   higher on chip RALLY".to_string();

    let aggregator = aggregator(vec![
        slow_source("Alpha", Duration::from_secs(1), alpha),
        slow_source("Beta", Duration::ZERO, beta),
    ]);
    let (articles, report) = aggregator.collect_with_report().await;

    assert_eq!(report.live_count, 9);
    assert_well_formed(&articles);
    let kept: Vec<_> = articles
        .iter()
        .filter(|a| dedup_key(&a.title) == "kospi closes higher on chip rally")
        .collect();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].source, "Alpha");
    assert_eq!(kept[0].title, "Kospi closes higher on chip rally");
}

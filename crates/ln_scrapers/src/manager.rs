use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use ln_core::{
    AggregationConfig, Article, ArticleCollector, Clock, Error, FetchError, Result, SourceKind, SourceSpec,
    SystemClock,
};
use tokio::time::Instant;
use tracing::info;

use crate::dedup::merge;
use crate::fallback::{blend, seed_articles};
use crate::http::HttpClient;
use crate::logging::Logger;
use crate::normalize::normalize_all;
use crate::retry::RetryPolicy;
use crate::scrapers::{adapter_for, SourceAdapter};

/// Slack on top of a source's own budget before the round gives up on it.
const OUTER_GRACE: Duration = Duration::from_secs(1);

struct BoundSource {
    spec: SourceSpec,
    adapter: Arc<dyn SourceAdapter>,
}

/// How one source fared in a round.
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub name: String,
    pub kind: SourceKind,
    /// Number of articles kept after normalization, or the fetch failure.
    pub result: std::result::Result<usize, FetchError>,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct CollectReport {
    pub outcomes: Vec<SourceOutcome>,
    /// Articles that came from live sources after merging.
    pub live_count: usize,
    pub fallback_used: bool,
    pub elapsed: Duration,
}

impl CollectReport {
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }
}

/// Runs every configured source concurrently and turns their output into
/// one ranked list. A round never fails: broken sources are logged and
/// skipped, and a short result is topped up with seed articles.
pub struct Aggregator {
    sources: Vec<BoundSource>,
    config: AggregationConfig,
    clock: Arc<dyn Clock>,
    logger: Logger,
}

impl Aggregator {
    /// Binds each spec to an adapter. Invalid or duplicate specs are a
    /// configuration error; nothing is fetched here.
    pub fn new(sources: Vec<(SourceSpec, Arc<dyn SourceAdapter>)>, config: AggregationConfig) -> Result<Self> {
        let mut names = HashSet::new();
        let mut bound = Vec::with_capacity(sources.len());
        for (spec, adapter) in sources {
            spec.validate()?;
            if !names.insert(spec.name.to_lowercase()) {
                return Err(Error::Config(format!("duplicate source name: {}", spec.name)));
            }
            if adapter.kind() != spec.kind {
                return Err(Error::Config(format!(
                    "{}: {:?} source bound to a {:?} adapter",
                    spec.name,
                    spec.kind,
                    adapter.kind()
                )));
            }
            bound.push(BoundSource { spec, adapter });
        }

        Ok(Self {
            sources: bound,
            config,
            clock: Arc::new(SystemClock),
            logger: Logger::new().with_prefix("collect"),
        })
    }

    /// Builds adapters from the specs' kinds. Search sources are skipped
    /// when no API key is configured.
    pub fn from_specs(
        specs: Vec<SourceSpec>,
        http: &HttpClient,
        retry: RetryPolicy,
        news_api_key: Option<&str>,
        config: AggregationConfig,
    ) -> Result<Self> {
        let mut sources = Vec::with_capacity(specs.len());
        for spec in specs {
            match adapter_for(spec.kind, http, retry, news_api_key) {
                Some(adapter) => sources.push((spec, adapter)),
                None => info!("⏭️ Skipping {}: no NEWS_API_KEY configured", spec.name),
            }
        }
        Self::new(sources, config)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    pub fn specs(&self) -> impl Iterator<Item = &SourceSpec> {
        self.sources.iter().map(|s| &s.spec)
    }

    pub async fn collect(&self) -> Vec<Article> {
        self.collect_with_report().await.0
    }

    pub async fn collect_with_report(&self) -> (Vec<Article>, CollectReport) {
        let started = Instant::now();
        info!("🔄 Collecting from {} sources", self.sources.len());

        let fetches = self.sources.iter().map(|source| async move {
            let budget = source.spec.budget();
            let started = Instant::now();
            let result = match tokio::time::timeout(budget + OUTER_GRACE, source.adapter.fetch(&source.spec, budget))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(FetchError::timeout(&source.spec.name, budget)),
            };
            (result, started.elapsed())
        });
        let results = join_all(fetches).await;

        let now = self.clock.now();
        let mut lists = Vec::with_capacity(results.len());
        let mut outcomes = Vec::with_capacity(results.len());
        for (source, (result, elapsed)) in self.sources.iter().zip(results) {
            let logger = self.logger.clone().with_prefix(source.spec.name.as_str());
            let result = match result {
                Ok(items) => {
                    let raw = items.len();
                    let articles = normalize_all(items, &source.spec, &self.config, now);
                    logger.info(&format!("✅ {} articles ({} raw) in {:?}", articles.len(), raw, elapsed));
                    let kept = articles.len();
                    lists.push(articles);
                    Ok(kept)
                }
                Err(e) => {
                    logger.warn(&format!("⚠️ {} after {:?}: {}", e.kind, elapsed, e.message));
                    Err(e)
                }
            };
            outcomes.push(SourceOutcome {
                name: source.spec.name.clone(),
                kind: source.spec.kind,
                result,
                elapsed,
            });
        }

        let live = merge(lists, self.config.max_results);
        let live_count = live.len();
        let fallback_used = live_count < self.config.min_viable;
        if live_count == 0 {
            self.logger.warn("⚠️ Every source failed, serving seed articles");
        } else if fallback_used {
            self.logger
                .info(&format!("🧩 Only {} live articles, topping up with seed articles", live_count));
        }
        let articles = blend(live, seed_articles(now), self.config.min_viable, self.config.max_results);

        let report = CollectReport {
            outcomes,
            live_count,
            fallback_used,
            elapsed: started.elapsed(),
        };
        info!(
            "📰 Collected {} articles ({} live, {} sources failed) in {:?}",
            articles.len(),
            live_count,
            report.failed(),
            report.elapsed
        );
        (articles, report)
    }
}

#[async_trait]
impl ArticleCollector for Aggregator {
    async fn collect(&self) -> Result<Vec<Article>> {
        Ok(self.collect_with_report().await.0)
    }
}

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ln_core::{Article, ArticleCollector, Clock, Result, SystemClock};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// An immutable aggregation result. Readers share it through an `Arc`; a
/// refresh publishes a new one instead of touching this one.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub articles: Arc<[Article]>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            articles: Arc::from(Vec::new()),
            fetched_at: None,
        }
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Strong validator for HTTP caching, derived from the publication time.
    pub fn etag(&self) -> Option<String> {
        self.fetched_at
            .map(|t| format!("\"{:x}-{}\"", t.timestamp_millis(), self.articles.len()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    Empty,
    Fresh,
    Stale,
    Refreshing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub fetched_at: Option<DateTime<Utc>>,
    pub count: usize,
    pub refreshing: bool,
    pub stale: bool,
}

/// Clears the refreshing flag when a refresh ends, even if it was cancelled.
struct RefreshingGuard<'a>(&'a AtomicBool);

impl<'a> RefreshingGuard<'a> {
    fn set(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for RefreshingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Serves the last aggregation result and re-aggregates once it is older
/// than the TTL. At most one refresh runs at a time; callers that find one
/// in flight get the previous snapshot instead of waiting.
pub struct CacheManager {
    collector: Arc<dyn ArticleCollector>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    snapshot: RwLock<Arc<Snapshot>>,
    refresh_lock: Mutex<()>,
    refreshing: AtomicBool,
    /// Bumped by every `invalidate()`.
    generation: AtomicU64,
    /// The generation the published snapshot was collected under.
    published_generation: AtomicU64,
}

impl CacheManager {
    pub fn new(collector: Arc<dyn ArticleCollector>, ttl: Duration) -> Self {
        Self {
            collector,
            ttl,
            clock: Arc::new(SystemClock),
            snapshot: RwLock::new(Arc::new(Snapshot::empty())),
            refresh_lock: Mutex::new(()),
            refreshing: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            published_generation: AtomicU64::new(0),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The current snapshot, refreshed first if it is stale and nobody else
    /// is refreshing it.
    pub async fn get(&self) -> Arc<Snapshot> {
        let current = self.current().await;
        if self.is_fresh(&current) {
            return current;
        }

        match self.refresh_lock.try_lock() {
            Ok(_guard) => {
                // A refresh may have published between the check and the lock.
                let current = self.current().await;
                if self.is_fresh(&current) {
                    return current;
                }
                match self.refresh_locked().await {
                    Ok(snapshot) => snapshot,
                    Err(_) => self.current().await,
                }
            }
            Err(_) if current.fetched_at.is_none() && current.is_empty() => {
                // Nothing to serve yet: share the outcome of the running refresh.
                debug!("⏳ Cache empty, waiting for the refresh in flight");
                let _guard = self.refresh_lock.lock().await;
                self.current().await
            }
            Err(_) => {
                debug!("⏳ Refresh in flight, serving previous snapshot");
                current
            }
        }
    }

    /// Marks the snapshot stale without dropping its articles. A refresh
    /// already running when this is called does not count as fresh.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        info!("🗑️ Cache invalidated");
    }

    /// Invalidates and refreshes, waiting for any refresh already running.
    pub async fn refresh_now(&self) -> Result<Arc<Snapshot>> {
        self.invalidate();
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Refreshes unless a refresh is already running. Returns whether one ran.
    pub async fn try_refresh(&self) -> bool {
        match self.refresh_lock.try_lock() {
            Ok(_guard) => {
                let _ = self.refresh_locked().await;
                true
            }
            Err(_) => false,
        }
    }

    pub async fn status(&self) -> CacheStatus {
        let current = self.current().await;
        CacheStatus {
            fetched_at: current.fetched_at,
            count: current.len(),
            refreshing: self.refreshing.load(Ordering::SeqCst),
            stale: !self.is_fresh(&current),
        }
    }

    pub async fn state(&self) -> CacheState {
        let current = self.current().await;
        if self.refreshing.load(Ordering::SeqCst) {
            CacheState::Refreshing
        } else if current.fetched_at.is_none() && current.is_empty() {
            CacheState::Empty
        } else if self.is_fresh(&current) {
            CacheState::Fresh
        } else {
            CacheState::Stale
        }
    }

    async fn current(&self) -> Arc<Snapshot> {
        self.snapshot.read().await.clone()
    }

    fn is_fresh(&self, snapshot: &Snapshot) -> bool {
        if self.published_generation.load(Ordering::SeqCst) != self.generation.load(Ordering::SeqCst) {
            return false;
        }
        match snapshot.fetched_at {
            // A clock that went backwards still counts as fresh.
            Some(fetched_at) => (self.clock.now() - fetched_at)
                .to_std()
                .map_or(true, |age| age < self.ttl),
            None => false,
        }
    }

    /// Must only be called while holding `refresh_lock`.
    async fn refresh_locked(&self) -> Result<Arc<Snapshot>> {
        let _flag = RefreshingGuard::set(&self.refreshing);
        let started = Instant::now();
        let generation = self.generation.load(Ordering::SeqCst);
        info!("🔄 Refreshing news cache");

        match self.collector.collect().await {
            Ok(articles) => {
                let snapshot = Arc::new(Snapshot {
                    articles: Arc::from(articles),
                    fetched_at: Some(self.clock.now()),
                });
                *self.snapshot.write().await = snapshot.clone();
                self.published_generation.store(generation, Ordering::SeqCst);
                info!("✨ Cache refreshed with {} articles in {:?}", snapshot.len(), started.elapsed());
                Ok(snapshot)
            }
            Err(e) => {
                warn!("⚠️ Refresh failed after {:?}, keeping previous snapshot: {}", started.elapsed(), e);
                Err(e)
            }
        }
    }
}

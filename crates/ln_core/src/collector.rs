use async_trait::async_trait;
use crate::types::Article;
use crate::Result;

/// Produces a complete, ranked article list for one aggregation round.
#[async_trait]
pub trait ArticleCollector: Send + Sync {
    /// Runs a full round. Partial source failure is not an error; only a
    /// broken collector (e.g. corrupt configuration) returns `Err`.
    async fn collect(&self) -> Result<Vec<Article>>;
}

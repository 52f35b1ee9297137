pub mod clock;
pub mod collector;
pub mod config;
pub mod error;
pub mod models;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use collector::ArticleCollector;
pub use config::{AggregationConfig, Settings};
pub use error::{Error, FetchError, FetchErrorKind, Result, SummaryError};
pub use models::Summarizer;
pub use types::{Article, Language, PageRules, RawItem, SourceKind, SourceSpec};

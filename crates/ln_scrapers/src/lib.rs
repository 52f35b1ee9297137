pub mod cli;
pub mod dedup;
pub mod fallback;
pub mod http;
pub mod logging;
pub mod manager;
pub mod normalize;
pub mod retry;
pub mod scrapers;
pub mod sources;

pub use cli::{handle_command, ScraperArgs, ScraperCommands};
pub use http::HttpClient;
pub use logging::{init_logging, Logger};
pub use manager::{Aggregator, CollectReport, SourceOutcome};
pub use retry::RetryPolicy;
pub use scrapers::{adapter_for, SourceAdapter};

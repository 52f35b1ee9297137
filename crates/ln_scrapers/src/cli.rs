use std::path::PathBuf;

use clap::{Args, Subcommand};
use ln_core::{AggregationConfig, Result, Settings, SourceKind, SourceSpec};

use crate::http::HttpClient;
use crate::manager::{Aggregator, SourceOutcome};
use crate::retry::RetryPolicy;
use crate::sources;

#[derive(Args, Debug, Clone)]
pub struct ScraperArgs {
    #[command(subcommand)]
    pub command: ScraperCommands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ScraperCommands {
    /// Run one aggregation round and print the articles as JSON
    Collect {
        /// JSON file with source definitions (defaults to the built-in list)
        #[arg(long)]
        sources: Option<PathBuf>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// List the configured sources
    Sources {
        /// JSON file with source definitions (defaults to the built-in list)
        #[arg(long)]
        sources: Option<PathBuf>,
    },
}

pub async fn handle_command(args: ScraperArgs, settings: &Settings) -> Result<()> {
    match args.command {
        ScraperCommands::Collect { sources, pretty } => {
            let specs = sources::resolve(sources.as_deref())?;
            let aggregator = Aggregator::from_specs(
                specs,
                &HttpClient::new()?,
                RetryPolicy::default(),
                settings.news_api_key.as_deref(),
                AggregationConfig::default(),
            )?;

            let (articles, report) = aggregator.collect_with_report().await;
            for outcome in &report.outcomes {
                eprintln!("{}", format_outcome(outcome));
            }
            eprintln!(
                "📰 {} articles ({} live{}) in {:?}",
                articles.len(),
                report.live_count,
                if report.fallback_used { ", topped up with seeds" } else { "" },
                report.elapsed
            );

            let json = if pretty {
                serde_json::to_string_pretty(&articles)?
            } else {
                serde_json::to_string(&articles)?
            };
            println!("{}", json);
        }
        ScraperCommands::Sources { sources } => {
            let specs = sources::resolve(sources.as_deref())?;
            println!("Configured sources:");
            for spec in &specs {
                println!("  {}", format_spec(spec, settings.news_api_key.is_some()));
            }
        }
    }
    Ok(())
}

fn format_outcome(outcome: &SourceOutcome) -> String {
    match &outcome.result {
        Ok(count) => format!("✅ {} - {} articles in {:?}", outcome.name, count, outcome.elapsed),
        Err(e) => format!("❌ {} - {}: {} ({:?})", outcome.name, e.kind, e.message, outcome.elapsed),
    }
}

fn format_spec(spec: &SourceSpec, has_search_key: bool) -> String {
    let kind = match spec.kind {
        SourceKind::Feed => "feed",
        SourceKind::Page => "page",
        SourceKind::Search => "search",
    };
    let skipped = if spec.kind == SourceKind::Search && !has_search_key {
        " [skipped: NEWS_API_KEY not set]"
    } else {
        ""
    };
    format!(
        "{} ({}, cap {}, {}s) {}{}",
        spec.name,
        kind,
        spec.item_cap,
        spec.budget().as_secs(),
        spec.endpoint,
        skipped
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ln_core::{FetchError, FetchErrorKind};
    use std::time::Duration;

    #[test]
    fn test_format_outcome() {
        let ok = SourceOutcome {
            name: "MK".to_string(),
            kind: SourceKind::Feed,
            result: Ok(7),
            elapsed: Duration::from_millis(250),
        };
        assert_eq!(format_outcome(&ok), "✅ MK - 7 articles in 250ms");

        let failed = SourceOutcome {
            result: Err(FetchError::new(FetchErrorKind::Blocked, "MK", "HTTP 403")),
            ..ok
        };
        assert_eq!(format_outcome(&failed), "❌ MK - blocked: HTTP 403 (250ms)");
    }

    #[test]
    fn test_format_spec_marks_skipped_search() {
        let spec = SourceSpec::new("NewsAPI", "https://newsapi.org/v2/top-headlines", SourceKind::Search);
        assert!(format_spec(&spec, false).ends_with("[skipped: NEWS_API_KEY not set]"));
        assert_eq!(
            format_spec(&spec, true),
            "NewsAPI (search, cap 5, 15s) https://newsapi.org/v2/top-headlines"
        );
    }
}

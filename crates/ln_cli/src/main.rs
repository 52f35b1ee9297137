use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ln_cache::{CacheManager, RefreshScheduler};
use ln_core::{AggregationConfig, Settings};
use ln_inference::{create_summarizer, summary_or_message};
use ln_scrapers::cli::{handle_command, ScraperArgs, ScraperCommands};
use ln_scrapers::{init_logging, sources, Aggregator, HttpClient, Logger, RetryPolicy};
use ln_web::{create_app, AppState};
use tokio::net::TcpListener;

mod duration;

use duration::HumanDuration;

#[derive(Parser, Debug)]
#[command(name = "livenews", author, version, about = "Live economic news aggregator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the news API
    Serve {
        /// Port to listen on (defaults to PORT or 3000)
        #[arg(long)]
        port: Option<u16>,
        /// How often the scheduler refreshes the cache (e.g. 10m, 1h, 90s)
        #[arg(long, default_value = "10m")]
        interval: HumanDuration,
        /// How long a collected result is served before it is refreshed
        #[arg(long, default_value = "10m")]
        ttl: HumanDuration,
        /// Only refresh on demand
        #[arg(long)]
        no_scheduler: bool,
        /// JSON file with source definitions (defaults to the built-in list)
        #[arg(long)]
        sources: Option<PathBuf>,
    },
    #[command(flatten)]
    Scrape(ScraperCommands),
    /// Summarize a single article
    Summarize {
        url: String,
    },
}

struct ServeOptions {
    port: Option<u16>,
    interval: HumanDuration,
    ttl: HumanDuration,
    no_scheduler: bool,
    sources: Option<PathBuf>,
}

async fn serve(settings: Settings, options: ServeOptions, logger: &Logger) -> anyhow::Result<()> {
    let specs = sources::resolve(options.sources.as_deref())?;
    let aggregator = Aggregator::from_specs(
        specs,
        &HttpClient::new()?,
        RetryPolicy::default(),
        settings.news_api_key.as_deref(),
        AggregationConfig::default(),
    )?;
    let names: Vec<&str> = aggregator.specs().map(|s| s.name.as_str()).collect();
    logger.info(&format!("🦗 Sources initialized: {}", names.join(", ")));

    let cache = Arc::new(CacheManager::new(Arc::new(aggregator), options.ttl.0));
    let summarizer = create_summarizer(&settings)?;

    let scheduler = if options.no_scheduler {
        logger.info("⏸️ Scheduler disabled, refreshing on demand only");
        None
    } else {
        Some(RefreshScheduler::spawn(cache.clone(), options.interval.0))
    };

    let app = create_app(AppState::new(cache, summarizer), &settings.allowed_origins);
    let port = options.port.unwrap_or(settings.port);
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    logger.info(&format!("🚀 Listening on http://{}", listener.local_addr()?));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(logger.clone()))
        .await?;

    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }
    logger.info("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal(logger: Logger) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        logger.error(&format!("Failed to listen for ctrl-c: {}", e));
        return;
    }
    logger.info("🛑 Shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let logger = init_logging().with_new_prefixes("livenews");
    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    tracing::debug!("Loaded settings: {:?}", settings);

    match cli.command {
        Commands::Serve {
            port,
            interval,
            ttl,
            no_scheduler,
            sources,
        } => {
            let options = ServeOptions {
                port,
                interval,
                ttl,
                no_scheduler,
                sources,
            };
            serve(settings, options, &logger).await?;
        }
        Commands::Scrape(command) => {
            handle_command(ScraperArgs { command }, &settings).await?;
        }
        Commands::Summarize { url } => {
            let summarizer = create_summarizer(&settings)?;
            println!("{}", summary_or_message(summarizer.summarize_url(&url).await));
        }
    }

    Ok(())
}

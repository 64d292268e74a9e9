use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobflow::config::Config;
use jobflow::crawler::{DetailEnricher, ListingCrawler};
use jobflow::indexer::Publisher;
use jobflow::storage::JobStore;

#[derive(Parser)]
#[command(
    name = "jobflow",
    version,
    about = "Incremental job-posting crawler with enrichment and search-index publication",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file (environment variables otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover job postings from the listing site
    Crawl {
        /// Single search term (all configured terms otherwise)
        #[arg(short, long)]
        term: Option<String>,
    },

    /// Fetch full descriptions for not-yet-enriched postings
    Enrich {
        /// Single search term (all configured terms otherwise)
        #[arg(short, long)]
        term: Option<String>,

        /// Override the configured per-run batch size
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Publish enriched postings into the remote index
    Publish {
        /// Single search term (all configured terms otherwise)
        #[arg(short, long)]
        term: Option<String>,
    },

    /// Run all three stages in order
    Run {
        /// Single search term (all configured terms otherwise)
        #[arg(short, long)]
        term: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate().context("Invalid configuration")?;

    tracing::info!("jobflow starting");

    match cli.command {
        Commands::Crawl { term } => {
            crawl(&config, resolve_terms(&config, term)?).await?;
        }
        Commands::Enrich { term, limit } => {
            enrich(&config, resolve_terms(&config, term)?, limit).await?;
        }
        Commands::Publish { term } => {
            publish(&config, resolve_terms(&config, term)?).await?;
        }
        Commands::Run { term } => {
            let terms = resolve_terms(&config, term)?;
            crawl(&config, terms.clone()).await?;
            enrich(&config, terms.clone(), None).await?;
            publish(&config, terms).await?;
        }
    }

    tracing::info!("jobflow completed");
    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("jobflow=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("jobflow=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}

/// Single term from the CLI, or the configured newline-delimited terms file
fn resolve_terms(config: &Config, term: Option<String>) -> Result<Vec<String>> {
    match term {
        Some(term) => Ok(vec![term]),
        None => config.search_terms(),
    }
}

async fn crawl(config: &Config, terms: Vec<String>) -> Result<()> {
    let store = JobStore::new(&config.crawler.data_dir);
    let crawler = ListingCrawler::new(&config.crawler)?;

    // Seed with every url captured by prior runs, across all terms: a term
    // can surface a posting already captured under a different term
    let mut known_urls = store.known_urls();

    for term in terms {
        let new_jobs = crawler.crawl(&term, &known_urls).await?;
        tracing::info!(term = %term, new_jobs, "Crawl stage finished for term");

        // Fold this term's checkpoint back in before the next term
        known_urls = store.known_urls();
    }

    Ok(())
}

async fn enrich(config: &Config, terms: Vec<String>, limit: Option<usize>) -> Result<()> {
    let store = JobStore::new(&config.crawler.data_dir);

    for term in terms {
        let mut enricher = DetailEnricher::new(store.clone(), &config.enricher);
        if let Some(limit) = limit {
            enricher = enricher.with_limit(limit);
        }

        let added = enricher.enrich(&term).await?;
        tracing::info!(term = %term, added, "Enrich stage finished for term");
    }

    Ok(())
}

async fn publish(config: &Config, terms: Vec<String>) -> Result<()> {
    let store = JobStore::new(&config.crawler.data_dir);
    let publisher = Publisher::new(store, &config.index)?;

    for term in terms {
        let published = publisher.publish(&term).await?;
        tracing::info!(term = %term, published, "Publish stage finished for term");
    }

    Ok(())
}

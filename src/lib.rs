//! jobflow - Incremental job-posting pipeline
//!
//! A three-stage crawl/enrich/publish pipeline that discovers job postings
//! from a paginated listing site, fetches full descriptions in a second
//! pass, and publishes normalized documents into a downstream search index
//! without ever reprocessing an item already seen.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`crawler`] - Listing discovery and detail enrichment
//! - [`parser`] - HTML parsing and field extraction
//! - [`indexer`] - Normalization and remote-index publication
//! - [`models`] - Core data structures and types
//! - [`storage`] - JSON checkpoint files and path layout
//!
//! Stages hand off exclusively through persisted, url-keyed checkpoint
//! files, which is what makes each one independently restartable after a
//! crash or rate-limit failure.
//!
//! # Example
//!
//! ```no_run
//! use jobflow::config::Config;
//! use jobflow::crawler::ListingCrawler;
//! use jobflow::storage::JobStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let store = JobStore::new(&config.crawler.data_dir);
//!     let crawler = ListingCrawler::new(&config.crawler)?;
//!     let new_jobs = crawler.crawl("data engineer", &store.known_urls()).await?;
//!     println!("Captured {new_jobs} new postings");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod indexer;
pub mod models;
pub mod parser;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::{DetailEnricher, ListingCrawler, PageFetcher};
    pub use crate::error::{Error, Result};
    pub use crate::indexer::Publisher;
    pub use crate::models::{FormattedJob, JobDetail, JobSummary};
    pub use crate::storage::JobStore;
}

// Direct re-exports for convenience
pub use models::{FormattedJob, JobDetail, JobSummary};
